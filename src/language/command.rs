use crate::errors::{self, Result};
use serde::Serialize;
use std::path::{Component, Path};

/// One externally executed step of a compilation pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandStep {
    pub argv: Vec<String>,
}

/// Ordered steps; the harness aborts at the first failing one.
pub type CompilationCommand = Vec<CommandStep>;

impl CommandStep {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Checks that the step can only touch the working directory: the program is named by an
    /// absolute path, and no argument is absolute, climbs out through `..`, or is a `@file`
    /// response file that would smuggle in further options.
    pub fn check_confinement(&self, step: usize) -> Result<()> {
        let unconfined = |token: &str| errors::UnconfinedCommand {
            step,
            token: token.to_string(),
        };

        let program = self.program().ok_or_else(|| unconfined(""))?;
        if !program.starts_with('/') {
            return Err(unconfined(program));
        }

        for token in &self.argv[1..] {
            if token.is_empty() {
                return Err(unconfined(token));
            }
            // Flags never carry paths
            if token.starts_with('-') {
                if token.contains('/') || token.contains("..") {
                    return Err(unconfined(token));
                }
                continue;
            }
            let path = Path::new(token);
            if path.is_absolute()
                || token.starts_with('@')
                || token.contains('\\')
                || path.components().any(|c| c == Component::ParentDir)
            {
                return Err(unconfined(token));
            }
        }

        Ok(())
    }
}

pub fn check_pipeline_confinement(pipeline: &[CommandStep]) -> Result<()> {
    pipeline
        .iter()
        .enumerate()
        .try_for_each(|(i, step)| step.check_confinement(i))
}
