//! Report Data Structures

use chrono::{DateTime, Utc};
use execbench_stats::BenchmarkStats;
use serde::{Deserialize, Serialize};

/// Name of the duration-only configuration in every matrix
pub const DURATION_NAME: &str = "Duration";

/// One cell of the benchmark matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    /// Metric configuration name (`Duration`, `Instructions`, ...)
    pub name: String,
    /// Whether the executor's asynchronous path was measured
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Executor identity
    pub executor: String,
    /// Summary of the cell's sample
    pub stats: BenchmarkStats,
}

impl BenchmarkResult {
    /// `"async"` or `"sync"`
    pub fn mode_label(&self) -> &'static str {
        if self.is_async { "async" } else { "sync" }
    }

    /// Whether this cell measured wall-clock duration
    pub fn is_duration(&self) -> bool {
        self.name == DURATION_NAME
    }
}

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// One row per matrix cell, in matrix order
    pub results: Vec<BenchmarkResult>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report format version
    pub schema_version: u32,
    /// execbench version that produced the report
    pub version: String,
    /// When the metadata was collected
    pub timestamp: DateTime<Utc>,
    /// HEAD commit of the working directory, if in a git repository
    pub git_commit: Option<String>,
    /// Current branch, if any
    pub git_branch: Option<String>,
    /// Host the run executed on
    pub system: SystemInfo,
    /// Settings of the run
    pub config: ReportConfig,
}

/// Run configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Invocations per cell
    pub runs: u32,
    /// Per-invocation wall-clock ceiling
    pub timeout_ms: u64,
    /// Compiled test artifact handed to executors
    pub test_artifact_path: String,
    /// Test function inside the artifact
    pub test_name: String,
    /// Executor identities in registration order
    pub executors: Vec<String>,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model name
    pub cpu: String,
    /// Logical CPU count
    pub cpu_cores: u32,
}
