//! Integration tests for execbench
//!
//! These tests drive the whole matrix end to end, with in-process executors
//! and with real `sh` child processes.

use clap::Parser;
use execbench::prelude::*;
use execbench::{
    BenchmarkError, PerfReport, aggregate, generate_csv_report, parse_csv_report,
    save_csv_report,
};
use execbench_cli::{Cli, run_with_cli};
use std::time::Duration;

/// Reports `duration` for duration-only runs and `metric_value` for every requested metric
fn synthetic(
    name: &str,
    sync_duration: u64,
    async_duration: u64,
    metric_value: f64,
) -> Box<dyn TestExecutor> {
    Box::new(InProcessExecutor::new(name, move |options: &TestOptions| {
        let duration = if options.is_async {
            async_duration
        } else {
            sync_duration
        };
        let result = TestResult::new(duration);
        Ok(match options.perf_report_config {
            Some(config) => result.with_perf_report(
                config
                    .enabled()
                    .fold(PerfReport::default(), |r, m| r.with(m, metric_value)),
            ),
            None => result,
        })
    }))
}

/// Executor script: `$1` artifact, `$2` test name, `$3` subcommand, then metric flags
const FAKE_EXECUTOR: &str = r#"
artifact="$1"; test="$2"; mode="$3"; shift 3
if [ "$artifact" != "a.json" ] || [ "$test" != "test_x()" ]; then
  echo "bad placeholders: $artifact $test" >&2; exit 2
fi
echo "progress noise"
if [ "$#" -eq 0 ]; then
  if [ "$mode" = "execute-test-async" ]; then echo '{"durationNs":2000}'; else echo '{"durationNs":1000}'; fi
else
  case "$1" in
    --instructions) echo '{"durationNs":1,"perfReport":{"instructions":500}}' ;;
    --cpu-migrations) echo '{"durationNs":1,"perfReport":{"cpuMigrations":0}}' ;;
    *) echo "unexpected flag $1" >&2; exit 3 ;;
  esac
fi
"#;

fn fake_process_executor(name: &str) -> ProcessExecutor {
    ProcessExecutor::new(
        name,
        "sh",
        ["-c", FAKE_EXECUTOR, "sh", "a.json", "test_x()"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ProcessRunner::new(Duration::from_secs(30), 64 * 1024),
    )
}

/// The default matrix has 8 configurations × 2 modes × N executors rows
#[test]
fn test_full_matrix_with_two_executors() {
    let mut matrix = BenchmarkMatrix::new(
        MetricConfiguration::defaults(),
        vec![
            synthetic("napi", 200, 300, 4.0),
            synthetic("native", 100, 150, 2.0),
        ],
    );

    let results = matrix.run(5).unwrap();
    assert_eq!(results.len(), 32);

    // First block: Duration, async before sync, executors in registration order
    let head: Vec<_> = results[..4]
        .iter()
        .map(|r| (r.name.as_str(), r.is_async, r.executor.as_str(), r.stats.median))
        .collect();
    assert_eq!(
        head,
        [
            ("Duration", true, "napi", 300.0),
            ("Duration", true, "native", 150.0),
            ("Duration", false, "napi", 200.0),
            ("Duration", false, "native", 100.0),
        ]
    );

    // Last block is CpuMigrations
    assert!(results[28..].iter().all(|r| r.name == "CpuMigrations"));
    assert!(results[4..].iter().all(|r| r.stats.median == 4.0 || r.stats.median == 2.0));

    let human = format_human_output(&results);
    assert!(human.contains("native/napi (async): 50.00%"), "{}", human);
    assert!(human.contains("napi async/sync: 150.00%"));
    assert!(human.contains("32 cells"));
}

/// Results persisted as CSV read back with the same identity columns
#[test]
fn test_csv_persistence_round_trip() {
    let mut matrix = BenchmarkMatrix::new(
        MetricConfiguration::defaults(),
        vec![synthetic("napi", 10, 20, 0.5)],
    );
    let results = matrix.run(3).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("results.csv");
    save_csv_report(&path, &results).unwrap();

    let parsed = parse_csv_report(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 16);
    for (a, b) in parsed.iter().zip(&results) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.is_async, b.is_async);
        assert_eq!(a.executor, b.executor);
        assert_eq!(a.stats.runs, b.stats.runs);
    }

    let csv = generate_csv_report(&results).unwrap();
    assert!(csv.starts_with("name,async,executor,runs,mean,median,min,max,stdDev\n"));
    assert!(csv.contains("\nDuration,true,napi,3,20"));
}

/// Real child processes: placeholders, subcommands and metric flags reach the executor
#[test]
fn test_process_executor_matrix() {
    let mut matrix = BenchmarkMatrix::new(
        MetricConfiguration::selection([Metric::Instructions, Metric::CpuMigrations]),
        vec![Box::new(fake_process_executor("sh"))],
    );

    let results = matrix.run(2).unwrap();
    let rows: Vec<_> = results
        .iter()
        .map(|r| (r.name.as_str(), r.is_async, r.stats.median))
        .collect();
    assert_eq!(
        rows,
        [
            ("Duration", true, 2000.0),
            ("Duration", false, 1000.0),
            ("Instructions", true, 500.0),
            ("Instructions", false, 500.0),
            // Zero is a present metric, not a fallback to duration
            ("CpuMigrations", true, 0.0),
            ("CpuMigrations", false, 0.0),
        ]
    );
}

/// A failing executor aborts the run and names the failing cell
#[test]
fn test_failing_process_aborts_with_context() {
    let failing = ProcessExecutor::new(
        "broken",
        "sh",
        vec!["-c".to_string(), "exit 7".to_string()],
        ProcessRunner::new(Duration::from_secs(30), 1024),
    );
    let mut matrix = BenchmarkMatrix::new(
        MetricConfiguration::defaults(),
        vec![synthetic("ok", 1, 1, 1.0), Box::new(failing)],
    );

    let err = matrix.run(1).unwrap_err();
    match &err {
        BenchmarkError::Execution {
            configuration,
            mode,
            executor,
            source: ExecutionError::NonZeroExit { code: Some(7) },
        } => {
            assert_eq!(configuration, "Duration");
            assert_eq!(*mode, "async");
            assert_eq!(executor, "broken");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("Duration (async) on broken"));
}

/// Statistics over a known sample
#[test]
fn test_aggregate_known_sample() {
    let stats = aggregate(&[4.0, 1.0, 3.0, 2.0]).unwrap();
    assert_eq!(stats.runs, 4);
    assert_eq!(stats.mean, 2.5);
    assert_eq!(stats.median, 2.5);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);
    assert!((stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
}

/// The CLI reads executors from a config file and writes both reports
#[test]
fn test_cli_benchmark_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let persisted = dir.path().join("persisted").join("results.csv");
    let output = dir.path().join("report.csv");
    let config_path = dir.path().join("execbench.toml");

    let config = format!(
        r#"
[runner]
runs = 3
timeout = "30s"
test_artifact_path = "a.json"
test_name = "test_x()"

[[executors]]
name = "first"
command = "sh"
args = ["-c", '''{script}''', "sh", "{{artifact}}", "{{test}}"]

[[executors]]
name = "second"
command = "sh"
args = ["-c", '''{script}''', "sh", "{{artifact}}", "{{test}}"]

[output]
format = "human"
csv_path = "{csv}"
"#,
        script = FAKE_EXECUTOR,
        csv = persisted.display()
    );
    std::fs::write(&config_path, config).unwrap();

    let cli = Cli::try_parse_from([
        "execbench".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
        "benchmark".to_string(),
        "-n".to_string(),
        "2".to_string(),
        "--instructions".to_string(),
        "--format".to_string(),
        "csv".to_string(),
        "-o".to_string(),
        output.display().to_string(),
    ])
    .unwrap();
    run_with_cli(cli).unwrap();

    let report = parse_csv_report(std::fs::File::open(&output).unwrap()).unwrap();
    // (Duration + Instructions) × 2 modes × 2 executors
    assert_eq!(report.len(), 8);
    assert!(report.iter().all(|r| r.stats.runs == 2));
    assert_eq!(report[0].executor, "first");
    assert_eq!(report[1].executor, "second");
    assert_eq!(report[4].name, "Instructions");
    assert_eq!(report[4].stats.median, 500.0);

    let saved = parse_csv_report(std::fs::File::open(&persisted).unwrap()).unwrap();
    assert_eq!(saved, report);
}

/// An executor that fails surfaces as a CLI error
#[test]
fn test_cli_propagates_executor_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("execbench.toml");
    std::fs::write(
        &config_path,
        r#"
[runner]
timeout = "30s"

[[executors]]
name = "broken"
command = "sh"
args = ["-c", "echo 'not json'"]
"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "execbench".to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
        "benchmark".to_string(),
        "-n".to_string(),
        "1".to_string(),
        "--format".to_string(),
        "csv".to_string(),
        "-o".to_string(),
        dir.path().join("never.csv").display().to_string(),
    ])
    .unwrap();

    let err = run_with_cli(cli).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("malformed executor output"), "{}", chain);
    assert!(!dir.path().join("never.csv").exists());
}
