use serde::Serialize;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExitStatus {
    ExitCode(i32),
    Signal(i32),
    /// Killed by the sandbox after exceeding its wall-time limit.
    TimedOut,
}

impl ExitStatus {
    pub fn is_success(self) -> bool {
        self == ExitStatus::ExitCode(0)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitStatus::ExitCode(code) => write!(f, "exit code {code}"),
            ExitStatus::Signal(signal) => write!(f, "killed by signal {signal}"),
            ExitStatus::TimedOut => write!(f, "time limit exceeded"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub argv: Vec<String>,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub real_time: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub enum Verdict {
    Success {
        #[serde(skip)]
        artifact: Vec<u8>,
    },
    CompilationError {
        /// Index of the failing step, absent when every step succeeded but the artifact is
        /// missing.
        failed_step: Option<usize>,
        diagnostics: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct CompilationResult {
    pub language: String,
    /// The artifact of an interpreted language is handed to its interpreter rather than run.
    pub interpreted: bool,
    pub steps: Vec<StepReport>,
    pub verdict: Verdict,
}

impl CompilationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Success { .. })
    }

    pub fn real_time(&self) -> Duration {
        self.steps.iter().map(|step| step.real_time).sum()
    }
}
