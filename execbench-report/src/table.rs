//! CSV Output
//!
//! The persisted form of a run: one row per matrix cell, in matrix order,
//! under a fixed header. Numbers use the writer's default float formatting.

use crate::ReportError;
use crate::report::BenchmarkResult;
use execbench_stats::BenchmarkStats;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// Column order of the persisted table
pub const CSV_HEADER: [&str; 9] = [
    "name", "async", "executor", "runs", "mean", "median", "min", "max", "stdDev",
];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    name: String,
    #[serde(rename = "async")]
    is_async: bool,
    executor: String,
    runs: u32,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
    #[serde(rename = "stdDev")]
    std_dev: f64,
}

impl From<&BenchmarkResult> for CsvRow {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            name: result.name.clone(),
            is_async: result.is_async,
            executor: result.executor.clone(),
            runs: result.stats.runs,
            mean: result.stats.mean,
            median: result.stats.median,
            min: result.stats.min,
            max: result.stats.max,
            std_dev: result.stats.std_dev,
        }
    }
}

impl From<CsvRow> for BenchmarkResult {
    fn from(row: CsvRow) -> Self {
        Self {
            name: row.name,
            is_async: row.is_async,
            executor: row.executor,
            stats: BenchmarkStats {
                runs: row.runs,
                mean: row.mean,
                median: row.median,
                min: row.min,
                max: row.max,
                std_dev: row.std_dev,
            },
        }
    }
}

/// Write results as CSV. The header is written even when `results` is empty.
pub fn write_csv<W: Write>(writer: W, results: &[BenchmarkResult]) -> Result<(), ReportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for result in results {
        csv_writer.serialize(CsvRow::from(result))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render results as a CSV string
pub fn generate_csv_report(results: &[BenchmarkResult]) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, results)?;
    Ok(String::from_utf8(buffer)?)
}

/// Persist results to `path`, creating parent directories as needed
pub fn save_csv_report(path: &Path, results: &[BenchmarkResult]) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), results)
}

/// Read a table produced by [`write_csv`] back into results
pub fn parse_csv_report<R: Read>(reader: R) -> Result<Vec<BenchmarkResult>, ReportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?;
    if !headers.iter().eq(CSV_HEADER) {
        return Err(ReportError::UnexpectedHeader {
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    csv_reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(BenchmarkResult::from).map_err(ReportError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use execbench_stats::aggregate;

    fn result(name: &str, is_async: bool, executor: &str, sample: &[f64]) -> BenchmarkResult {
        BenchmarkResult {
            name: name.to_string(),
            is_async,
            executor: executor.to_string(),
            stats: aggregate(sample).unwrap(),
        }
    }

    #[test]
    fn test_header_and_row_layout() {
        let csv = generate_csv_report(&[result("Duration", true, "napi", &[2.0, 4.0])]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,async,executor,runs,mean,median,min,max,stdDev")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Duration,true,napi,2,"), "row was {}", row);
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_results_still_have_header() {
        let csv = generate_csv_report(&[]).unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));
        assert!(parse_csv_report(csv.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_identity_columns() {
        let results = vec![
            result("Duration", true, "napi", &[1.0, 2.0, 3.0]),
            result("Duration", false, "native", &[0.1, 0.2]),
            result("InstructionsPerCycle", true, "node, v22", &[1.75]),
        ];
        let csv = generate_csv_report(&results).unwrap();
        let parsed = parse_csv_report(csv.as_bytes()).unwrap();

        let identity = |r: &BenchmarkResult| (r.name.clone(), r.is_async, r.executor.clone(), r.stats.runs);
        assert_eq!(
            parsed.iter().map(identity).collect::<Vec<_>>(),
            results.iter().map(identity).collect::<Vec<_>>()
        );
        for (a, b) in parsed.iter().zip(&results) {
            assert!((a.stats.median - b.stats.median).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_foreign_header() {
        let err = parse_csv_report("a,b,c\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedHeader { .. }));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.csv");
        let results = vec![result("Duration", false, "native", &[5.0])];

        save_csv_report(&path, &results).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let parsed = parse_csv_report(file).unwrap();
        assert_eq!(parsed, results);
    }
}
