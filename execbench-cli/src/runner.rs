//! Executor Process Runner
//!
//! Launches an executor as a child process, enforces the wall-clock and
//! output ceilings, and decodes the result line it prints.
//!
//! stdin and stderr are inherited so the executor's diagnostics reach the
//! operator live; only stdout is captured.

use execbench_protocol::{LineError, TestOptions, TestResult, decode_result_line};
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default wall-clock ceiling for one invocation (1 hour)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Default ceiling on captured stdout (100 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024 * 1024;

/// Interval between liveness checks while waiting for exit
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time a child gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Time stdout may stay open after the child exited, held by processes it spawned
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Errors raised by a single executor invocation
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Child could not be started
    #[error("failed to start executor `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Wall-clock ceiling reached; the child was terminated
    #[error("executor timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success exit; `None` when killed by a signal
    #[error("executor exited with {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    /// Stdout went past the ceiling
    #[error("executor output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    /// Trailing stdout line is not a result
    #[error("malformed executor output: {0}")]
    MalformedOutput(#[from] LineError),

    #[error("I/O error while supervising executor: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an in-process executor
    #[error("in-process executor failed: {0}")]
    InProcess(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Signal every process in the group led by `pid`
fn signal_group(pid: u32, signal: libc::c_int) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(-(pid as libc::pid_t), signal) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Running executor, leader of its own process group; terminated on drop if still alive
struct ExecutorProcess {
    child: Child,
}

impl ExecutorProcess {
    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for exit until `deadline`; `None` if the deadline passed first
    fn wait_until(&mut self, deadline: Instant) -> Result<Option<ExitStatus>, std::io::Error> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            std::thread::sleep(remaining.min(POLL_INTERVAL));
        }
    }

    /// SIGKILL whatever is left of the group after the leader exited
    fn kill_stragglers(&mut self) {
        // ESRCH when the group is already empty
        let _ = signal_group(self.child.id(), libc::SIGKILL);
    }

    /// SIGTERM to the group, a short grace window, then SIGKILL. Always reaps the child.
    fn terminate(&mut self) {
        if !self.is_alive() {
            self.kill_stragglers();
            return;
        }
        // The child may have exited in between
        let _ = signal_group(self.child.id(), libc::SIGTERM);
        if let Ok(Some(_)) = self.wait_until(Instant::now() + TERMINATE_GRACE) {
            self.kill_stragglers();
            return;
        }
        warn!(pid = self.child.id(), "executor ignored SIGTERM, killing");
        self.kill_stragglers();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ExecutorProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Drain stdout on a helper thread, stopping one byte past `limit`
fn spawn_reader(
    mut stdout: ChildStdout,
    limit: usize,
) -> mpsc::Receiver<Result<Vec<u8>, std::io::Error>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let read = (&mut stdout)
            .take(limit as u64 + 1)
            .read_to_end(&mut buffer)
            .map(|_| buffer);
        // Receiver is gone when the invocation already failed
        let _ = tx.send(read);
    });
    rx
}

/// Runs executor processes under a timeout and output ceiling
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    max_output_bytes: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl ProcessRunner {
    /// Create a runner with explicit ceilings
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }

    /// Wall-clock ceiling per invocation
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ceiling on captured stdout
    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Invoke `command args... <subcommand> <metric flags...>` once.
    ///
    /// The output is only decoded after a zero exit status.
    pub fn run(
        &self,
        command: &str,
        args: &[String],
        options: &TestOptions,
    ) -> Result<TestResult, ExecutionError> {
        let option_args = options.to_args();
        debug!(command, ?args, ?option_args, "spawning executor");

        let mut child = Command::new(command)
            .args(args)
            .args(&option_args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .process_group(0)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let mut process = ExecutorProcess { child };
        let stdout = stdout.ok_or_else(|| std::io::Error::other("executor stdout not captured"))?;

        let start = Instant::now();
        let deadline = start + self.timeout;
        let output_rx = spawn_reader(stdout, self.max_output_bytes);

        // Stdout EOF alone does not mean the child is done, nor does its exit
        // mean stdout is closed: background processes may inherit the pipe.
        let mut exit_status = None;
        let mut drain_deadline = None;
        let mut stragglers_killed = false;
        let output = loop {
            match output_rx.recv_timeout(POLL_INTERVAL) {
                Ok(read) => break read?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ExecutionError::Io(std::io::Error::other(
                        "executor stdout reader exited without a result",
                    )));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                process.terminate();
                return Err(ExecutionError::Timeout(self.timeout));
            }

            if exit_status.is_none() {
                if let Some(status) = process.child.try_wait()? {
                    exit_status = Some(status);
                    drain_deadline = Some(now + DRAIN_GRACE);
                }
            } else if !stragglers_killed && drain_deadline.is_some_and(|d| now >= d) {
                warn!(
                    pid = process.child.id(),
                    "executor exited with stdout still open, killing its process group"
                );
                process.kill_stragglers();
                stragglers_killed = true;
            }
        };

        if output.len() > self.max_output_bytes {
            process.terminate();
            return Err(ExecutionError::OutputTooLarge {
                limit: self.max_output_bytes,
            });
        }

        let status = match exit_status {
            Some(status) => status,
            None => match process.wait_until(deadline)? {
                Some(status) => status,
                None => {
                    process.terminate();
                    return Err(ExecutionError::Timeout(self.timeout));
                }
            },
        };
        debug!(
            ?status,
            bytes = output.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "executor exited"
        );

        if !status.success() {
            return Err(ExecutionError::NonZeroExit {
                code: status.code(),
            });
        }

        Ok(decode_result_line(&output)?)
    }
}
