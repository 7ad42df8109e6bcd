use crate::harness::sandbox::Sandbox;
use crate::harness::submission::Submission;
use crate::language::command::check_pipeline_confinement;
use crate::language::registry::LanguageRegistry;
use crate::verdict::{CompilationResult, ExitStatus, StepReport, Verdict};
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Turns submissions into executables by running the pipeline of their language, one step at a
/// time, in a fresh working directory.
///
/// Compilations share nothing but the registry, so any number of them may run concurrently.
#[derive(Clone)]
pub struct Compiler {
    registry: Arc<LanguageRegistry>,
    sandbox: Arc<dyn Sandbox>,
}

impl Compiler {
    pub fn new(registry: Arc<LanguageRegistry>, sandbox: Arc<dyn Sandbox>) -> Self {
        Self { registry, sandbox }
    }

    /// Resolution and validation failures are returned as `Err` (wrapping [`crate::errors::Error`]),
    /// as are infrastructure failures. A submission that does not compile is an `Ok` carrying
    /// [`Verdict::CompilationError`]; retrying it cannot change the outcome.
    pub async fn compile(&self, submission: &Submission) -> Result<CompilationResult> {
        let language = self.registry.resolve(submission.primary_source()?)?;
        submission.validate(language.as_ref())?;

        let pipeline = language.get_compilation_commands(
            &submission.sources,
            &submission.executable,
            submission.for_evaluation,
        );
        check_pipeline_confinement(&pipeline)?;

        let workdir = tempfile::Builder::new()
            .prefix("arbiter-compile-")
            .tempdir()
            .context("Failed to create a working directory")?;

        for (name, contents) in &submission.files {
            tokio::fs::write(workdir.path().join(name), contents)
                .await
                .with_context(|| format!("Failed to materialize {name}"))?;
        }

        let mut steps: Vec<StepReport> = Vec::with_capacity(pipeline.len());
        let mut failure = None;

        for (index, step) in pipeline.iter().enumerate() {
            let report = self
                .sandbox
                .run(step, workdir.path())
                .await
                .with_context(|| format!("Failed to run compilation step {index}"))?;
            let failed = !report.status.is_success();
            steps.push(report);
            if failed {
                failure = Some(index);
                break;
            }
        }

        let verdict = match failure {
            Some(index) => Verdict::CompilationError {
                failed_step: Some(index),
                diagnostics: diagnostics_of(&steps[index]),
            },
            None => read_artifact(&workdir.path().join(&submission.executable))
                .await
                .with_context(|| {
                    format!("Failed to read the executable {}", submission.executable)
                })?
                .map_or_else(
                    || Verdict::CompilationError {
                        failed_step: None,
                        diagnostics: format!(
                            "Compilation finished, but the executable {} was not produced",
                            submission.executable
                        ),
                    },
                    |artifact| Verdict::Success { artifact },
                ),
        };

        let result = CompilationResult {
            language: language.name().to_string(),
            interpreted: !language.is_compiled(),
            steps,
            verdict,
        };

        if result.is_success() {
            info!(
                language = %result.language,
                executable = %submission.executable,
                elapsed = ?result.real_time(),
                "Compilation succeeded"
            );
        } else {
            warn!(
                language = %result.language,
                executable = %submission.executable,
                elapsed = ?result.real_time(),
                "Compilation failed"
            );
        }

        if let Err(e) = workdir.close() {
            warn!("Failed to remove compilation directory: {e}");
        }

        Ok(result)
    }
}

/// Returns `None` unless the step left a regular file at `path`. Symlinks do not count, since
/// they may point outside the working directory.
async fn read_artifact(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_file() => tokio::fs::read(path).await.map(Some),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn diagnostics_of(report: &StepReport) -> String {
    let mut diagnostics = String::new();
    if report.status == ExitStatus::TimedOut {
        diagnostics.push_str("Compilation exceeded the time limit\n");
    } else {
        diagnostics.push_str(&format!("Compiler terminated with {}\n", report.status));
    }
    diagnostics.push_str(&report.stdout);
    diagnostics.push_str(&report.stderr);
    diagnostics
}
