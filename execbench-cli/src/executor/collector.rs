//! Sample Collection
//!
//! Invokes an executor a fixed number of times and reduces each result to
//! one scalar: the first metric present in the perf report (canonical metric
//! order), otherwise the measured duration in nanoseconds.

use super::executors::TestExecutor;
use crate::runner::ExecutionError;
use execbench_protocol::{Metric, TestOptions, TestResult};
use tracing::{debug, warn};

/// The scalar a single result contributes to its sample
pub fn sample_value(result: &TestResult) -> f64 {
    result
        .perf_report
        .as_ref()
        .and_then(|report| report.first_present())
        .map(|(_, value)| value)
        .unwrap_or(result.duration_ns as f64)
}

/// Metrics enabled in `options` that `result` did not report
pub(crate) fn missing_metrics(options: &TestOptions, result: &TestResult) -> Vec<Metric> {
    options
        .perf_report_config
        .iter()
        .flat_map(|config| config.enabled())
        .filter(|metric| {
            result
                .perf_report
                .as_ref()
                .and_then(|report| report.get(*metric))
                .is_none()
        })
        .collect()
}

/// Run `executor` `count` times sequentially and collect one value per run.
///
/// The first failing invocation aborts collection; no partial sample is returned.
/// A result missing a requested metric contributes its duration and is warned
/// about once per sample.
pub fn collect<E>(
    count: u32,
    options: &TestOptions,
    executor: &mut E,
) -> Result<Vec<f64>, ExecutionError>
where
    E: TestExecutor + ?Sized,
{
    let mut sample = Vec::with_capacity(count as usize);
    let mut warned = false;
    for run in 0..count {
        let result = executor.execute(options)?;
        if !warned {
            let missing = missing_metrics(options, &result);
            if !missing.is_empty() {
                warn!(
                    executor = executor.name(),
                    run,
                    ?missing,
                    "requested metrics not reported, using duration"
                );
                warned = true;
            }
        }
        let value = sample_value(&result);
        debug!(executor = executor.name(), run, value, "collected observation");
        sample.push(value);
    }
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InProcessExecutor;
    use execbench_protocol::{PerfReport, PerfReportConfig};

    #[test]
    fn test_duration_when_no_report() {
        assert_eq!(sample_value(&TestResult::new(1500)), 1500.0);
    }

    #[test]
    fn test_empty_report_falls_back_to_duration() {
        let result = TestResult::new(9).with_perf_report(PerfReport::default());
        assert_eq!(sample_value(&result), 9.0);
    }

    #[test]
    fn test_first_metric_in_canonical_order_wins() {
        // instructionsPerCycle precedes cpuMigrations regardless of magnitude
        let report = PerfReport::default()
            .with(Metric::CpuMigrations, 3.0)
            .with(Metric::InstructionsPerCycle, 0.9);
        let result = TestResult::new(100).with_perf_report(report);
        assert_eq!(sample_value(&result), 0.9);
    }

    #[test]
    fn test_zero_metric_is_still_present() {
        let report = PerfReport::default().with(Metric::CpuMigrations, 0.0);
        let result = TestResult::new(100).with_perf_report(report);
        assert_eq!(sample_value(&result), 0.0);
    }

    #[test]
    fn test_missing_metrics() {
        let options = TestOptions::new(
            Some(PerfReportConfig::from_metrics([
                Metric::L1DataCacheHitRate,
                Metric::BranchMissRatio,
            ])),
            false,
        );
        let partial = TestResult::new(5)
            .with_perf_report(PerfReport::default().with(Metric::BranchMissRatio, 0.1));
        assert_eq!(
            missing_metrics(&options, &partial),
            [Metric::L1DataCacheHitRate]
        );
        assert_eq!(
            missing_metrics(&options, &TestResult::new(5)),
            [Metric::L1DataCacheHitRate, Metric::BranchMissRatio]
        );
        assert!(missing_metrics(&TestOptions::default(), &TestResult::new(5)).is_empty());
    }

    #[test]
    fn test_omitted_metric_falls_back_to_duration() {
        // Ratio metrics are absent when their denominator is zero
        let options = TestOptions::new(Some(PerfReportConfig::only(Metric::L1DataCacheHitRate)), true);
        let mut calls = 0u64;
        let mut executor = InProcessExecutor::new("sparse", |_: &TestOptions| {
            calls += 1;
            let result = TestResult::new(1000 * calls);
            Ok(if calls == 1 {
                result.with_perf_report(PerfReport::default().with(Metric::L1DataCacheHitRate, 0.97))
            } else {
                result
            })
        });
        let sample = collect(3, &options, &mut executor).unwrap();
        assert_eq!(sample, [0.97, 2000.0, 3000.0]);
    }

    #[test]
    fn test_collects_count_values_in_order() {
        let mut next = 0u64;
        let mut executor = InProcessExecutor::new("counter", |_: &TestOptions| {
            next += 10;
            Ok(TestResult::new(next))
        });
        let sample = collect(3, &TestOptions::default(), &mut executor).unwrap();
        assert_eq!(sample, [10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_zero_count_invokes_nothing() {
        let mut calls = 0;
        let mut executor = InProcessExecutor::new("never", |_: &TestOptions| {
            calls += 1;
            Ok(TestResult::new(1))
        });
        let sample = collect(0, &TestOptions::default(), &mut executor).unwrap();
        assert!(sample.is_empty());
        drop(executor);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_first_failure_aborts() {
        let mut calls = 0;
        let mut executor = InProcessExecutor::new("flaky", |_: &TestOptions| {
            calls += 1;
            if calls == 2 {
                Err(ExecutionError::NonZeroExit { code: Some(1) })
            } else {
                Ok(TestResult::new(1))
            }
        });
        let err = collect(5, &TestOptions::default(), &mut executor).unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExit { code: Some(1) }));
        drop(executor);
        assert_eq!(calls, 2);
    }
}
