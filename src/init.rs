use crate::context::{self, AppContext};
use crate::harness::{compiler::Compiler, sandbox::LocalSandbox, submission::Submission};
use crate::language::registry::LanguageRegistry;
use crate::ranking::contest::FileContest;
use crate::verdict::Verdict;
use crate::{config, web};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CLIArgs {
    #[clap(short, long)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the public ranking
    Serve,

    /// Compile local files the way submissions are compiled
    Compile {
        /// Name of the executable to produce
        #[clap(short, long)]
        executable: String,

        /// Compile without the evaluation instrumentation
        #[clap(long)]
        no_evaluation: bool,

        /// Files that are materialized but not passed to the compiler (headers, graders)
        #[clap(long = "with")]
        extra: Vec<PathBuf>,

        /// Source files; the first one decides the language
        #[clap(required = true)]
        sources: Vec<PathBuf>,
    },
}

pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli_args = CLIArgs::parse();
    let config = config::Config::load(&cli_args.config)?;
    let registry = Arc::new(
        context::build_registry(&config).context("Failed to set up compilation languages")?,
    );

    match cli_args.command {
        Command::Serve => serve(config, registry).await,
        Command::Compile {
            executable,
            no_evaluation,
            extra,
            sources,
        } => {
            let sandbox = Arc::new(LocalSandbox {
                time_limit: Duration::from_secs(config.compilation.step_timeout_secs),
            });
            let compiler = Compiler::new(registry, sandbox);
            let submission =
                Submission::from_paths(&sources, &extra, executable, !no_evaluation).await?;
            compile(&compiler, &submission).await
        }
    }
}

async fn serve(config: config::Config, registry: Arc<LanguageRegistry>) -> Result<()> {
    let source = Arc::new(FileContest::new(&config.data.contest));
    let ctx = AppContext::new(registry, source)?;

    if let Err(e) = ctx.cache.refresh().await {
        warn!("Initial ranking refresh failed: {e:#}");
    }

    let ctx = Arc::new(ctx.with_scheduler(Duration::from_secs(
        config.ranking.refresh_interval_secs,
    )));

    let listener = TcpListener::bind(&config.listen.ranking)
        .await
        .with_context(|| {
            format!(
                "Failed to listen on {:?} (this address is from field listen.ranking of the \
                 configuration file)",
                config.listen.ranking
            )
        })?;

    info!(
        "Ranking server for contest {:?} started on {}",
        ctx.cache.current().contest_name,
        config.listen.ranking
    );

    axum::serve(listener, web::router::build_router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Ranking server failed")?;

    info!("Ranking server stopped");
    Ok(())
}

async fn compile(compiler: &Compiler, submission: &Submission) -> Result<()> {
    let result = compiler.compile(submission).await?;

    for (index, step) in result.steps.iter().enumerate() {
        println!(
            "step {index}: {} ({}, {:?})",
            step.argv.join(" "),
            step.status,
            step.real_time
        );
        print!("{}{}", step.stdout, step.stderr);
    }

    match result.verdict {
        Verdict::Success { artifact } => {
            tokio::fs::write(&submission.executable, &artifact)
                .await
                .with_context(|| format!("Failed to write {}", submission.executable))?;
            println!(
                "{}: {} {} ({} bytes)",
                result.language,
                if result.interpreted { "prepared" } else { "compiled" },
                submission.executable,
                artifact.len()
            );
            Ok(())
        }
        Verdict::CompilationError { diagnostics, .. } => {
            println!("{}: compilation error", result.language);
            println!("{diagnostics}");
            std::process::exit(1);
        }
    }
}
