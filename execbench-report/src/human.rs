//! Human Output
//!
//! Terminal summary of a benchmark matrix, one block per metric configuration:
//! - Each cell's median (duration cells in both ms and ns)
//! - Every executor's median as a percentage of the first executor's, per mode
//! - Each executor's async median as a percentage of its sync median

use crate::report::BenchmarkResult;

/// `numerator` as a percentage of `denominator`, `None` when undefined
pub fn percentage(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator * 100.0;
    ratio.is_finite().then_some(ratio)
}

fn format_percentage(value: Option<f64>) -> String {
    value
        .map(|p| format!("{:.2}%", p))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_median(result: &BenchmarkResult) -> String {
    let median = result.stats.median;
    if result.is_duration() {
        format!("{:.3} ms ({:.0} ns)", median / 1_000_000.0, median.round())
    } else {
        format!("{:.2}", median)
    }
}

/// Format results for terminal display, keeping matrix order
pub fn format_human_output(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("execbench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    // Group by configuration name in first-seen order
    let mut groups: Vec<(&str, Vec<&BenchmarkResult>)> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|(name, _)| *name == result.name) {
            Some((_, cells)) => cells.push(result),
            None => groups.push((result.name.as_str(), vec![result])),
        }
    }

    for (name, cells) in &groups {
        output.push_str(&format!("{}\n", name));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        let width = cells.iter().map(|c| c.executor.len()).max().unwrap_or(8);

        for cell in cells {
            output.push_str(&format!(
                "  {:<width$}  {:<5}  median: {}  stddev: {:.2}  runs: {}\n",
                cell.executor,
                cell.mode_label(),
                format_median(cell),
                cell.stats.std_dev,
                cell.stats.runs,
                width = width
            ));
        }

        let ratios = ratio_lines(cells);
        if !ratios.is_empty() {
            output.push('\n');
            for line in ratios {
                output.push_str(&format!("  {}\n", line));
            }
        }
        output.push('\n');
    }

    output.push_str(&format!("{} cells\n", results.len()));
    output
}

fn ratio_lines(cells: &[&BenchmarkResult]) -> Vec<String> {
    let mut executors: Vec<&str> = Vec::new();
    for cell in cells {
        if !executors.contains(&cell.executor.as_str()) {
            executors.push(cell.executor.as_str());
        }
    }

    let median = |executor: &str, is_async: bool| {
        cells
            .iter()
            .find(|c| c.executor == executor && c.is_async == is_async)
            .map(|c| c.stats.median)
    };

    let mut lines = Vec::new();

    for (is_async, mode) in [(true, "async"), (false, "sync")] {
        let present: Vec<(&str, f64)> = executors
            .iter()
            .filter_map(|e| median(*e, is_async).map(|m| (*e, m)))
            .collect();
        if let Some(((baseline, baseline_median), others)) = present.split_first() {
            for (executor, value) in others {
                lines.push(format!(
                    "{}/{} ({}): {}",
                    executor,
                    baseline,
                    mode,
                    format_percentage(percentage(*value, *baseline_median))
                ));
            }
        }
    }

    for executor in &executors {
        if let (Some(async_median), Some(sync_median)) =
            (median(*executor, true), median(*executor, false))
        {
            lines.push(format!(
                "{} async/sync: {}",
                executor,
                format_percentage(percentage(async_median, sync_median))
            ));
        }
    }

    lines
}
