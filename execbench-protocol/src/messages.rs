//! Protocol Message Types
//!
//! All messages are serialized as camelCase JSON to match what host-runtime
//! executors emit.

use crate::metric::Metric;
use crate::{ASYNC_SUBCOMMAND, SYNC_SUBCOMMAND};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Outcome of a single executor invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Elapsed time of the measured call in nanoseconds
    #[serde(deserialize_with = "deserialize_duration_ns")]
    pub duration_ns: u64,
    /// Counter metrics, present only when the invocation requested some
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perf_report: Option<PerfReport>,
}

impl TestResult {
    /// Create a duration-only result
    pub fn new(duration_ns: u64) -> Self {
        Self {
            duration_ns,
            perf_report: None,
        }
    }

    /// Attach a performance report
    pub fn with_perf_report(mut self, perf_report: PerfReport) -> Self {
        self.perf_report = Some(perf_report);
        self
    }
}

/// Host runtimes often report durations as doubles, so accept any
/// non-negative JSON number and round it.
fn deserialize_duration_ns<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(ns) = number.as_u64() {
        return Ok(ns);
    }
    match number.as_f64() {
        Some(ns) if ns.is_finite() && ns >= 0.0 && ns <= u64::MAX as f64 => Ok(ns.round() as u64),
        _ => Err(D::Error::custom(format!(
            "durationNs must be a non-negative number, got {}",
            number
        ))),
    }
}

/// Sparse set of counter metrics.
///
/// Each field is independently optional; an absent metric was not collected,
/// which is different from a metric that was collected and is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfReport {
    /// Retired instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<f64>,
    /// Retired instructions per CPU cycle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_per_cycle: Option<f64>,
    /// Last-level cache hit rate in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_level_cache_hit_rate: Option<f64>,
    /// L1 data cache hit rate in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_data_cache_hit_rate: Option<f64>,
    /// L1 instruction cache misses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_instruction_cache_misses: Option<f64>,
    /// Mispredicted share of branches in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_miss_ratio: Option<f64>,
    /// Times the thread moved between CPUs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_migrations: Option<f64>,
}

impl PerfReport {
    /// Value of a metric, `None` if it was not reported
    pub fn get(&self, metric: Metric) -> Option<f64> {
        *self.slot(metric)
    }

    /// Builder-style setter
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        *self.slot_mut(metric) = Some(value);
        self
    }

    /// First reported metric in [`Metric::ALL`] order, whatever its value
    pub fn first_present(&self) -> Option<(Metric, f64)> {
        Metric::ALL
            .into_iter()
            .find_map(|metric| self.get(metric).map(|value| (metric, value)))
    }

    /// Whether no metric was reported at all
    pub fn is_empty(&self) -> bool {
        self.first_present().is_none()
    }

    fn slot(&self, metric: Metric) -> &Option<f64> {
        match metric {
            Metric::Instructions => &self.instructions,
            Metric::InstructionsPerCycle => &self.instructions_per_cycle,
            Metric::LastLevelCacheHitRate => &self.last_level_cache_hit_rate,
            Metric::L1DataCacheHitRate => &self.l1_data_cache_hit_rate,
            Metric::L1InstructionCacheMisses => &self.l1_instruction_cache_misses,
            Metric::BranchMissRatio => &self.branch_miss_ratio,
            Metric::CpuMigrations => &self.cpu_migrations,
        }
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::Instructions => &mut self.instructions,
            Metric::InstructionsPerCycle => &mut self.instructions_per_cycle,
            Metric::LastLevelCacheHitRate => &mut self.last_level_cache_hit_rate,
            Metric::L1DataCacheHitRate => &mut self.l1_data_cache_hit_rate,
            Metric::L1InstructionCacheMisses => &mut self.l1_instruction_cache_misses,
            Metric::BranchMissRatio => &mut self.branch_miss_ratio,
            Metric::CpuMigrations => &mut self.cpu_migrations,
        }
    }
}

/// Which metrics the executor should collect.
///
/// A config with every toggle off means plain duration measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerfReportConfig {
    /// Collect retired instructions
    pub instructions: bool,
    /// Collect instructions per cycle
    pub instructions_per_cycle: bool,
    /// Collect the last-level cache hit rate
    pub last_level_cache_hit_rate: bool,
    /// Collect the L1 data cache hit rate
    pub l1_data_cache_hit_rate: bool,
    /// Collect L1 instruction cache misses
    pub l1_instruction_cache_misses: bool,
    /// Collect the branch miss ratio
    pub branch_miss_ratio: bool,
    /// Collect CPU migrations
    pub cpu_migrations: bool,
}

impl PerfReportConfig {
    /// Config with exactly one metric enabled
    pub fn only(metric: Metric) -> Self {
        Self::from_metrics([metric])
    }

    /// Config enabling every metric in `metrics`
    pub fn from_metrics(metrics: impl IntoIterator<Item = Metric>) -> Self {
        let mut config = Self::default();
        for metric in metrics {
            *config.toggle_mut(metric) = true;
        }
        config
    }

    /// Whether a metric is enabled
    pub fn is_enabled(&self, metric: Metric) -> bool {
        match metric {
            Metric::Instructions => self.instructions,
            Metric::InstructionsPerCycle => self.instructions_per_cycle,
            Metric::LastLevelCacheHitRate => self.last_level_cache_hit_rate,
            Metric::L1DataCacheHitRate => self.l1_data_cache_hit_rate,
            Metric::L1InstructionCacheMisses => self.l1_instruction_cache_misses,
            Metric::BranchMissRatio => self.branch_miss_ratio,
            Metric::CpuMigrations => self.cpu_migrations,
        }
    }

    /// Enabled metrics in [`Metric::ALL`] order
    pub fn enabled(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL
            .into_iter()
            .filter(move |metric| self.is_enabled(*metric))
    }

    /// Whether no metric is enabled
    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none()
    }

    fn toggle_mut(&mut self, metric: Metric) -> &mut bool {
        match metric {
            Metric::Instructions => &mut self.instructions,
            Metric::InstructionsPerCycle => &mut self.instructions_per_cycle,
            Metric::LastLevelCacheHitRate => &mut self.last_level_cache_hit_rate,
            Metric::L1DataCacheHitRate => &mut self.l1_data_cache_hit_rate,
            Metric::L1InstructionCacheMisses => &mut self.l1_instruction_cache_misses,
            Metric::BranchMissRatio => &mut self.branch_miss_ratio,
            Metric::CpuMigrations => &mut self.cpu_migrations,
        }
    }
}

/// Configuration of a single executor invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestOptions {
    /// Metrics to collect; `None` measures duration only
    pub perf_report_config: Option<PerfReportConfig>,
    /// Use the executor's asynchronous call path
    pub is_async: bool,
}

impl TestOptions {
    /// Create options for one invocation
    pub fn new(perf_report_config: Option<PerfReportConfig>, is_async: bool) -> Self {
        Self {
            perf_report_config,
            is_async,
        }
    }

    /// Mode subcommand; exactly one of the two is ever passed
    pub fn subcommand(&self) -> &'static str {
        if self.is_async {
            ASYNC_SUBCOMMAND
        } else {
            SYNC_SUBCOMMAND
        }
    }

    /// One flag per enabled metric, in [`Metric::ALL`] order
    pub fn metric_flags(&self) -> Vec<&'static str> {
        self.perf_report_config
            .iter()
            .flat_map(|config| config.enabled())
            .map(Metric::flag)
            .collect()
    }

    /// Executor arguments: the mode subcommand followed by the metric flags
    pub fn to_args(&self) -> Vec<String> {
        std::iter::once(self.subcommand())
            .chain(self.metric_flags())
            .map(str::to_string)
            .collect()
    }
}
