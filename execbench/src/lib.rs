#![warn(missing_docs)]
//! # execbench
//!
//! Benchmarks the synchronous and asynchronous call paths of one test across
//! several executors (for example a Node.js binding and a native binary).
//!
//! - **Process Isolation**: every invocation is a fresh child process with a
//!   wall-clock ceiling and an output cap
//! - **Hardware Counters**: each executor can report instructions, IPC, cache
//!   hit rates, branch misses and CPU migrations alongside duration
//! - **Fixed Matrix**: configuration × async/sync × executor, always in the
//!   same order, so tables line up across runs
//! - **Reports**: CSV for persistence, JSON with run metadata, and a terminal
//!   summary with cross-executor ratios
//!
//! ## Quick Start
//!
//! ```ignore
//! use execbench::prelude::*;
//!
//! let native = InProcessExecutor::new("native", |options: &TestOptions| {
//!     let start = std::time::Instant::now();
//!     run_my_test(options.is_async);
//!     Ok(TestResult::new(start.elapsed().as_nanos() as u64))
//! });
//!
//! let mut matrix = BenchmarkMatrix::new(
//!     vec![MetricConfiguration::duration()],
//!     vec![Box::new(native) as Box<dyn TestExecutor>],
//! );
//! let results = matrix.run(27)?;
//! println!("{}", format_human_output(&results));
//! ```

// Re-export the executor protocol
pub use execbench_protocol::{
    LineError, Metric, PerfReport, PerfReportConfig, TestOptions, TestResult,
    decode_result_line, encode_result_line,
};

// Re-export the driver
pub use execbench_cli::{
    BenchmarkError, BenchmarkMatrix, ExecbenchConfig, ExecutionError, InProcessExecutor,
    MetricConfiguration, ProcessExecutor, ProcessRunner, TestExecutor, collect, sample_value,
};

// Re-export stats
pub use execbench_stats::{BenchmarkStats, StatsError, aggregate};

// Re-export reports
pub use execbench_report::{
    BenchmarkResult, OutputFormat, Report, ReportError, format_human_output,
    generate_csv_report, generate_json_report, parse_csv_report, save_csv_report,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkMatrix, BenchmarkResult, ExecutionError, InProcessExecutor, Metric,
        MetricConfiguration, ProcessExecutor, ProcessRunner, TestExecutor, TestOptions,
        TestResult, format_human_output,
    };
}

/// Run the execbench CLI.
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     execbench::run()
/// }
/// ```
pub use execbench_cli::run;
