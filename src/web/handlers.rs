use crate::context::AppContext;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{error, warn};

static TASK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9_-]+$").expect("task name pattern is valid")
});

fn render_failure(e: minijinja::Error) -> Response {
    error!("Failed to render page: {e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
}

/// Shows the standings, refreshed for this request.
pub async fn ranking(State(ctx): State<Arc<AppContext>>) -> Response {
    let view = match ctx.cache.refresh().await {
        Ok(view) => view,
        Err(e) => {
            warn!("Ranking refresh failed, showing the previous ranking: {e:#}");
            ctx.cache.current()
        }
    };

    let languages: Vec<&str> = ctx.registry.languages().map(|l| l.name()).collect();
    match ctx.templates.render_ranking(&view, &languages) {
        Ok(page) => Html(page).into_response(),
        Err(e) => render_failure(e),
    }
}

/// Shows a task and statistics about it. An unknown task is answered with a plain message
/// rather than an error status.
pub async fn task_details(
    State(ctx): State<Arc<AppContext>>,
    Path(task_name): Path<String>,
) -> Response {
    if !TASK_NAME.is_match(&task_name) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let view = ctx.cache.current();
    let Some(task) = view.task(&task_name) else {
        return format!("Task {task_name} not found.").into_response();
    };

    match ctx.templates.render_task(&view, task) {
        Ok(page) => Html(page).into_response(),
        Err(e) => render_failure(e),
    }
}

/// Serves the statement as a PDF download. Any failure, including the task being unknown,
/// is a 404.
pub async fn task_statement(
    State(ctx): State<Arc<AppContext>>,
    Path(task_name): Path<String>,
) -> Response {
    if !TASK_NAME.is_match(&task_name) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let Ok(task) = ctx.cache.get_task(&task_name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(statement) = ctx.cache.get_task_statement(&task).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", task.name),
            ),
        ],
        statement,
    )
        .into_response()
}
