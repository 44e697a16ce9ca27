#![warn(missing_docs)]
//! execbench Executor Protocol
//!
//! The contract between the orchestrator and a test executor:
//! - [`TestOptions`] describe one invocation and derive the executor's command-line arguments
//! - [`TestResult`] is what the executor reports back as a single JSON line on stdout
//! - [`PerfReport`] carries the sparse hardware counter metrics, addressed by [`Metric`]
//!
//! An executor is invoked as
//!
//! ```text
//! <command> <template args...> execute-test-sync|execute-test-async [--<metric>...]
//! ```
//!
//! and must print `{"durationNs": 1234, "perfReport": {...}}` as its last line,
//! exiting with status 0.

mod line;
mod messages;
mod metric;

pub use line::{LineError, decode_result_line, encode_result_line, trailing_line};
pub use messages::{PerfReport, PerfReportConfig, TestOptions, TestResult};
pub use metric::Metric;

/// Subcommand selecting the executor's synchronous call path
pub const SYNC_SUBCOMMAND: &str = "execute-test-sync";

/// Subcommand selecting the executor's asynchronous call path
pub const ASYNC_SUBCOMMAND: &str = "execute-test-async";
