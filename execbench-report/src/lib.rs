#![warn(missing_docs)]
//! execbench Report - Rendering and Persistence
//!
//! Generates the output formats for a benchmark matrix:
//! - CSV (the persisted table, one row per matrix cell)
//! - JSON (results plus run metadata)
//! - Human (terminal summary with cross-executor ratios)

mod human;
mod json;
mod report;
mod table;

pub use human::{format_human_output, percentage};
pub use json::generate_json_report;
pub use report::{
    BenchmarkResult, DURATION_NAME, Report, ReportConfig, ReportMeta, SystemInfo,
};
pub use table::{CSV_HEADER, generate_csv_report, parse_csv_report, save_csv_report, write_csv};

use thiserror::Error;

/// Errors raised while rendering or reading reports
#[derive(Debug, Error)]
pub enum ReportError {
    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the report file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rendered CSV is not UTF-8
    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// CSV file does not start with the expected header
    #[error("unexpected CSV header: {found}")]
    UnexpectedHeader { found: String },
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// CSV table with header row
    Csv,
    /// JSON with run metadata
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
