//! Benchmark Executor
//!
//! Drives executors through the benchmark matrix and collects results.
//!
//! ## Pipeline Overview
//!
//! ```text
//! MetricConfiguration × mode × TestExecutor
//!       │
//!       ▼
//! ┌─────────────┐
//! │   matrix    │  Enumerate cells in fixed order
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  collector  │  Invoke the executor N times, extract one scalar each
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  aggregate  │  Summary statistics per cell (execbench-stats)
//! └──────┬──────┘
//!        │
//!        ▼
//!  Vec<BenchmarkResult>
//! ```
//!
//! ## Modules
//!
//! - [`executors`] - The executor abstraction and its process/in-process forms
//! - [`collector`] - Repeated invocation and scalar extraction
//! - [`matrix`] - Matrix enumeration and per-cell aggregation
//! - [`metadata`] - System metadata collection

mod collector;
mod executors;
mod matrix;
mod metadata;

// Re-export public API
pub use collector::{collect, sample_value};
pub use executors::{InProcessExecutor, ProcessExecutor, TestExecutor};
pub use matrix::{BenchmarkError, BenchmarkMatrix, MODES, MetricConfiguration};
pub use metadata::build_report_meta;
