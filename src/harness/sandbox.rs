use crate::language::command::CommandStep;
use crate::verdict::{ExitStatus, StepReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Diagnostics beyond this many bytes per stream are cut off.
const MAX_CAPTURED_OUTPUT: usize = 1 << 20;

/// Executes a single step inside a working directory under resource limits.
///
/// An `Err` means the step could not be executed at all (infrastructure failure). Anything the
/// step itself did wrong, a timeout included, is reported through [`StepReport::status`].
#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn run(&self, step: &CommandStep, workdir: &Path) -> Result<StepReport>;
}

/// Runs steps as plain child processes with a cleared environment and a wall-time limit.
/// Stronger isolation is expected to come from the process hosting the compiler.
pub struct LocalSandbox {
    pub time_limit: Duration,
}

#[async_trait]
impl Sandbox for LocalSandbox {
    async fn run(&self, step: &CommandStep, workdir: &Path) -> Result<StepReport> {
        let (program, args) = step
            .argv
            .split_first()
            .context("Cannot run an empty command")?;

        debug!(argv = ?step.argv, workdir = %workdir.display(), "Running compilation step");

        // The step leads its own process group so that whatever it forks can be killed with it
        let mut child = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .env_clear()
            .env("PATH", "/usr/local/bin:/usr/bin:/bin")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {program:?}"))?;

        let group = child
            .id()
            .and_then(|pid| i32::try_from(pid).ok())
            .map(Pid::from_raw)
            .context("Started process has no pid")?;

        let stdout = tokio::spawn(capture(child.stdout.take()));
        let stderr = tokio::spawn(capture(child.stderr.take()));

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.time_limit, child.wait()).await;
        let real_time = started.elapsed();

        // Background processes left by the step would otherwise outlive it and keep the pipes open
        kill_group(group);

        let status = match outcome {
            Err(_elapsed) => {
                child
                    .wait()
                    .await
                    .with_context(|| format!("Failed to reap {program:?}"))?;
                ExitStatus::TimedOut
            }
            Ok(status) => {
                let status = status.with_context(|| format!("Failed to wait for {program:?}"))?;
                match (status.code(), status.signal()) {
                    (Some(code), _) => ExitStatus::ExitCode(code),
                    (None, Some(signal)) => ExitStatus::Signal(signal),
                    (None, None) => ExitStatus::Signal(0),
                }
            }
        };

        Ok(StepReport {
            argv: step.argv.clone(),
            status,
            stdout: stdout.await.context("Output reader panicked")?,
            stderr: stderr.await.context("Output reader panicked")?,
            real_time,
        })
    }
}

fn kill_group(group: Pid) {
    match killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill process group {group}: {e}"),
    }
}

/// Keeps the first [`MAX_CAPTURED_OUTPUT`] bytes of a stream and discards the rest, so that the
/// writer never blocks on a full pipe.
async fn capture(stream: Option<impl AsyncRead + Unpin>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut kept = Vec::new();
    let _ = (&mut stream)
        .take(MAX_CAPTURED_OUTPUT as u64)
        .read_to_end(&mut kept)
        .await;
    let _ = tokio::io::copy(&mut stream, &mut tokio::io::sink()).await;
    String::from_utf8_lossy(&kept).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox(seconds: u64) -> LocalSandbox {
        LocalSandbox {
            time_limit: Duration::from_secs(seconds),
        }
    }

    #[tokio::test]
    async fn captures_status_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/bin/sh", "-c", "echo out; echo err >&2; exit 3"]);
        let report = sandbox(10).run(&step, dir.path()).await.unwrap();
        assert_eq!(report.status, ExitStatus::ExitCode(3));
        assert_eq!(report.stdout, "out\n");
        assert_eq!(report.stderr, "err\n");
    }

    #[tokio::test]
    async fn runs_inside_the_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/bin/sh", "-c", "echo built > sol"]);
        let report = sandbox(10).run(&step, dir.path()).await.unwrap();
        assert!(report.status.is_success());
        assert!(dir.path().join("sol").exists());
    }

    #[tokio::test]
    async fn slow_steps_time_out() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/bin/sh", "-c", "sleep 5"]);
        let limited = LocalSandbox {
            time_limit: Duration::from_millis(100),
        };
        let report = limited.run(&step, dir.path()).await.unwrap();
        assert_eq!(report.status, ExitStatus::TimedOut);
    }

    #[tokio::test]
    async fn timeout_kills_background_processes() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/bin/sh", "-c", "(sleep 2; touch marker) & sleep 30"]);
        let limited = LocalSandbox {
            time_limit: Duration::from_millis(500),
        };
        let report = limited.run(&step, dir.path()).await.unwrap();
        assert_eq!(report.status, ExitStatus::TimedOut);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn background_processes_do_not_outlive_a_finished_step() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/bin/sh", "-c", "(sleep 1; touch marker) & exit 0"]);
        let report = sandbox(10).run(&step, dir.path()).await.unwrap();
        assert!(report.status.is_success());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn large_output_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new([
            "/bin/sh",
            "-c",
            "head -c 5000000 /dev/zero; head -c 3000000 /dev/zero >&2",
        ]);
        let report = sandbox(30).run(&step, dir.path()).await.unwrap();
        assert!(report.status.is_success());
        assert_eq!(report.stdout.len(), MAX_CAPTURED_OUTPUT);
        assert_eq!(report.stderr.len(), MAX_CAPTURED_OUTPUT);
    }

    #[tokio::test]
    async fn missing_program_is_an_infrastructure_error() {
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep::new(["/nonexistent/compiler"]);
        assert!(sandbox(10).run(&step, dir.path()).await.is_err());
    }
}
