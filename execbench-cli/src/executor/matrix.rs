//! Benchmark Matrix
//!
//! Enumerates every (configuration, mode, executor) cell in a fixed order,
//! collects a sample for each and aggregates it.
//!
//! ```text
//! for configuration in configurations      Duration, Instructions, ...
//!     for is_async in [true, false]
//!         for executor in executors        registration order
//!             collect → aggregate → BenchmarkResult
//! ```

use super::collector::collect;
use super::executors::TestExecutor;
use crate::runner::ExecutionError;
use execbench_protocol::{Metric, PerfReportConfig, TestOptions};
use execbench_report::{BenchmarkResult, DURATION_NAME};
use execbench_stats::{StatsError, aggregate};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::info;

/// Modes in matrix order: async first, then sync
pub const MODES: [bool; 2] = [true, false];

fn mode_label(is_async: bool) -> &'static str {
    if is_async { "async" } else { "sync" }
}

/// A named metric selection; the outer dimension of the matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MetricConfiguration {
    /// Row name in reports
    pub name: String,
    /// `None` measures duration only
    pub perf_report_config: Option<PerfReportConfig>,
}

impl MetricConfiguration {
    /// Duration only
    pub fn duration() -> Self {
        Self {
            name: DURATION_NAME.to_string(),
            perf_report_config: None,
        }
    }

    /// Exactly one metric enabled
    pub fn metric(metric: Metric) -> Self {
        Self {
            name: metric.display_name().to_string(),
            perf_report_config: Some(PerfReportConfig::only(metric)),
        }
    }

    /// Duration followed by every metric
    pub fn defaults() -> Vec<Self> {
        Self::selection(Metric::ALL)
    }

    /// Duration followed by the given metrics, deduplicated, in canonical order
    pub fn selection(metrics: impl IntoIterator<Item = Metric>) -> Vec<Self> {
        let selected = PerfReportConfig::from_metrics(metrics);
        std::iter::once(Self::duration())
            .chain(selected.enabled().map(Self::metric))
            .collect()
    }
}

/// Errors that abort a matrix run
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// `run(0)`
    #[error("run count must be at least 1")]
    InvalidRunCount,

    /// An invocation in the cell failed
    #[error("{configuration} ({mode}) on {executor}: {source}")]
    Execution {
        configuration: String,
        mode: &'static str,
        executor: String,
        #[source]
        source: ExecutionError,
    },

    /// The cell's sample could not be aggregated
    #[error("{configuration} ({mode}) on {executor}: {source}")]
    Stats {
        configuration: String,
        mode: &'static str,
        executor: String,
        #[source]
        source: StatsError,
    },
}

/// The configuration × mode × executor matrix
pub struct BenchmarkMatrix {
    configurations: Vec<MetricConfiguration>,
    executors: Vec<Box<dyn TestExecutor>>,
    show_progress: bool,
}

impl BenchmarkMatrix {
    /// Matrix over `configurations`, executors in registration order
    pub fn new(
        configurations: Vec<MetricConfiguration>,
        executors: Vec<Box<dyn TestExecutor>>,
    ) -> Self {
        Self {
            configurations,
            executors,
            show_progress: false,
        }
    }

    /// Show a progress bar ticking once per cell
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Number of cells (= result rows)
    pub fn cell_count(&self) -> usize {
        self.configurations.len() * MODES.len() * self.executors.len()
    }

    /// Outer dimension, in run order
    pub fn configurations(&self) -> &[MetricConfiguration] {
        &self.configurations
    }

    /// Executor identities in registration order
    pub fn executor_names(&self) -> Vec<String> {
        self.executors.iter().map(|e| e.name().to_string()).collect()
    }

    /// Run every cell `count` times, in matrix order.
    ///
    /// The first failing cell aborts the run.
    pub fn run(&mut self, count: u32) -> Result<Vec<BenchmarkResult>, BenchmarkError> {
        if count == 0 {
            return Err(BenchmarkError::InvalidRunCount);
        }

        let pb = if self.show_progress {
            ProgressBar::new(self.cell_count() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut results = Vec::with_capacity(self.cell_count());

        for configuration in &self.configurations {
            for is_async in MODES {
                let options = TestOptions::new(configuration.perf_report_config, is_async);
                let mode = mode_label(is_async);

                for executor in self.executors.iter_mut() {
                    pb.set_message(format!(
                        "{} {} {}",
                        configuration.name,
                        mode,
                        executor.name()
                    ));

                    let sample = collect(count, &options, executor.as_mut()).map_err(|source| {
                        BenchmarkError::Execution {
                            configuration: configuration.name.clone(),
                            mode,
                            executor: executor.name().to_string(),
                            source,
                        }
                    })?;
                    let stats = aggregate(&sample).map_err(|source| BenchmarkError::Stats {
                        configuration: configuration.name.clone(),
                        mode,
                        executor: executor.name().to_string(),
                        source,
                    })?;

                    info!(
                        configuration = %configuration.name,
                        mode,
                        executor = executor.name(),
                        median = stats.median,
                        "cell complete"
                    );

                    results.push(BenchmarkResult {
                        name: configuration.name.clone(),
                        is_async,
                        executor: executor.name().to_string(),
                        stats,
                    });
                    pb.inc(1);
                }
            }
        }

        pb.finish_with_message("Complete");
        Ok(results)
    }
}
