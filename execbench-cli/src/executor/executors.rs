//! Executors
//!
//! A [`TestExecutor`] turns one [`TestOptions`] into one [`TestResult`].
//! [`ProcessExecutor`] launches an external program per invocation;
//! [`InProcessExecutor`] wraps a closure, for embedding and tests.

use crate::config::ExecutorConfig;
use crate::runner::{ExecutionError, ProcessRunner};
use execbench_protocol::{TestOptions, TestResult};

/// Something that can run the test under measurement once
pub trait TestExecutor {
    /// Identity reported in results
    fn name(&self) -> &str;

    /// Run the test once with the given mode and metric selection
    fn execute(&mut self, options: &TestOptions) -> Result<TestResult, ExecutionError>;
}

/// Executor backed by an external program
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    name: String,
    command: String,
    args: Vec<String>,
    runner: ProcessRunner,
}

impl ProcessExecutor {
    /// Executor running `command args...` per invocation
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        runner: ProcessRunner,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            runner,
        }
    }

    /// Build from configuration, substituting the artifact and test placeholders
    pub fn from_config(
        config: &ExecutorConfig,
        artifact: &str,
        test: &str,
        runner: ProcessRunner,
    ) -> Self {
        Self::new(
            config.name.clone(),
            config.command.clone(),
            config.resolve_args(artifact, test),
            runner,
        )
    }

    /// Program launched per invocation
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Arguments placed before the subcommand
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl TestExecutor for ProcessExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, options: &TestOptions) -> Result<TestResult, ExecutionError> {
        self.runner.run(&self.command, &self.args, options)
    }
}

/// Executor backed by a closure in the current process
pub struct InProcessExecutor<F> {
    name: String,
    call: F,
}

impl<F> InProcessExecutor<F>
where
    F: FnMut(&TestOptions) -> Result<TestResult, ExecutionError>,
{
    /// Executor calling `call` per invocation
    pub fn new(name: impl Into<String>, call: F) -> Self {
        Self {
            name: name.into(),
            call,
        }
    }
}

impl<F> TestExecutor for InProcessExecutor<F>
where
    F: FnMut(&TestOptions) -> Result<TestResult, ExecutionError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, options: &TestOptions) -> Result<TestResult, ExecutionError> {
        (self.call)(options)
    }
}
