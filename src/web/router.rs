use crate::context::AppContext;
use crate::web::handlers;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Read-only routes of the public ranking server. There is no authentication.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(handlers::ranking))
        .route("/tasks/{task_name}", get(handlers::task_details))
        .route("/task_statement/{task_name}", get(handlers::task_statement))
        .with_state(ctx)
}
