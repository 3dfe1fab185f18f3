//! Supervises one solver process per [`RunRequest`]: builds the command line
//! from the declared contract, enforces the wall-clock budget, and classifies
//! the outcome. Per-run failures are isolated; nothing here aborts a sweep.

use crate::registry::{RunOutcome, RunRequest, RunResult};
use crate::solver::output::{parse_stdout, stderr_excerpt};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::{timeout, Instant};

/// Extra wall-clock allowance beyond the solver's declared budget, so it can
/// flush its final output after hitting its own internal deadline.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(15);

/// Runs solver processes with a hard `budget + grace` timeout.
///
/// The invoker's only side effect is the spawned process; it never writes
/// files. On timeout the whole process group is terminated so solver-spawned
/// children do not outlive the run.
#[derive(Debug, Clone, Copy)]
pub struct SolverInvoker {
    grace: Duration,
}

impl Default for SolverInvoker {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }
}

impl SolverInvoker {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Executes one run and classifies it. Every failure mode maps to a
    /// [`RunOutcome`] variant; this function itself never errors.
    pub async fn invoke(&self, request: RunRequest) -> RunResult {
        let outcome = self.classify(&request).await;
        if !matches!(outcome, RunOutcome::Success { .. }) {
            tracing::warn!(
                instance = %request.instance.id(),
                algorithm = %request.algorithm.name,
                outcome = outcome.label(),
                "run did not succeed"
            );
        }
        RunResult { request, outcome }
    }

    async fn classify(&self, request: &RunRequest) -> RunOutcome {
        // Detected before any process is spawned.
        if !request.instance.available || !request.instance.path.is_file() {
            return RunOutcome::MissingInput;
        }

        let spec = &request.algorithm;
        let args = spec.command_args(&request.instance.path, request.time_budget, request.seed);
        let deadline = request.time_budget + self.grace;

        let mut command = Command::new(&spec.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return RunOutcome::NonZeroExit {
                    code: None,
                    stderr_excerpt: stderr_excerpt(&format!(
                        "failed to spawn {}: {err}",
                        spec.binary.display()
                    )),
                };
            }
        };

        // Drain both pipes concurrently with the wait so a chatty solver
        // cannot deadlock on a full pipe buffer.
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = match timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                terminate(&mut child).await;
                return RunOutcome::NonZeroExit {
                    code: None,
                    stderr_excerpt: stderr_excerpt(&format!("failed to wait on solver: {err}")),
                };
            }
            Err(_) => {
                terminate(&mut child).await;
                tracing::warn!(
                    instance = %request.instance.id(),
                    algorithm = %spec.name,
                    budget_secs = request.time_budget.as_secs(),
                    grace_secs = self.grace.as_secs(),
                    "solver exceeded budget plus grace; process group terminated"
                );
                return RunOutcome::Timeout;
            }
        };

        let wall = started.elapsed();
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let stdout = String::from_utf8_lossy(&stdout);
        let stderr = String::from_utf8_lossy(&stderr);

        if !status.success() {
            return RunOutcome::NonZeroExit {
                code: status.code(),
                stderr_excerpt: stderr_excerpt(&stderr),
            };
        }

        match parse_stdout(&stdout, spec.sign) {
            Ok((value, elapsed_ms)) => {
                tracing::debug!(
                    instance = %request.instance.id(),
                    algorithm = %spec.name,
                    value,
                    wall_ms = wall.as_millis() as u64,
                    "run succeeded"
                );
                RunOutcome::Success { value, elapsed_ms }
            }
            Err(err) => RunOutcome::MalformedOutput { detail: err.detail },
        }
    }
}

/// Kills the solver and, on unix, its whole process group (the child was
/// spawned as a group leader), then reaps it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    let _ = child.kill().await;
    let _ = child.wait().await;
}
