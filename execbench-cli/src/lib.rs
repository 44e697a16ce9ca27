#![warn(missing_docs)]
//! execbench CLI Library
//!
//! Drives external test executors through the sync/async benchmark matrix
//! and renders the results. `execbench::run()` (or `execbench_cli::run()`)
//! is the full command-line experience; the matrix, executors and runner are
//! also usable directly as a library.
//!
//! # Example
//!
//! ```ignore
//! use execbench_cli::{BenchmarkMatrix, InProcessExecutor, MetricConfiguration, TestExecutor};
//! use execbench_protocol::{TestOptions, TestResult};
//!
//! let executor = InProcessExecutor::new("local", |_: &TestOptions| Ok(TestResult::new(1_000)));
//! let mut matrix = BenchmarkMatrix::new(
//!     MetricConfiguration::defaults(),
//!     vec![Box::new(executor) as Box<dyn TestExecutor>],
//! );
//! let results = matrix.run(27)?;
//! ```

mod config;
mod executor;
mod runner;

pub use config::*;
pub use executor::{
    BenchmarkError, BenchmarkMatrix, InProcessExecutor, MODES, MetricConfiguration,
    ProcessExecutor, TestExecutor, build_report_meta, collect, sample_value,
};
pub use runner::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT, ExecutionError, ProcessRunner};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use execbench_protocol::{Metric, PerfReport, PerfReportConfig, TestOptions};
use execbench_report::{
    OutputFormat, Report, ReportConfig, format_human_output, generate_csv_report,
    generate_json_report, save_csv_report,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// execbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "execbench")]
#[command(author, version, about = "execbench - sync/async executor benchmarking")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: execbench.toml, searched upwards)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke one executor once and print the measured value
    ExecuteTest {
        /// Executor name from the configuration (default: the first one)
        #[arg(long)]
        executor: Option<String>,

        /// Use the executor's asynchronous path
        #[arg(long = "async")]
        is_async: bool,

        /// Metrics to collect
        #[command(flatten)]
        metrics: MetricFlags,
    },
    /// Run the benchmark matrix
    Benchmark(BenchmarkArgs),
    /// Write a default execbench.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Arguments of the `benchmark` subcommand
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Invocations per matrix cell (default: runner.runs, 27)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: Option<u32>,

    /// Restrict the matrix to Duration plus these metrics
    #[command(flatten)]
    pub metrics: MetricFlags,

    /// Output format: human, csv, json (default: output.format)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override runner.test_artifact_path
    #[arg(long)]
    pub test_artifact_path: Option<String>,

    /// Override runner.test_name
    #[arg(long)]
    pub test_name: Option<String>,
}

/// One switch per metric
#[derive(Args, Debug, Clone, Default)]
pub struct MetricFlags {
    /// Retired instructions
    #[arg(long = "instructions")]
    pub instructions: bool,
    /// Instructions per CPU cycle
    #[arg(long = "instructions-per-cycle")]
    pub instructions_per_cycle: bool,
    /// Last level cache hit rate
    #[arg(long = "last-level-cache-hit-rate")]
    pub last_level_cache_hit_rate: bool,
    /// L1 data cache hit rate
    #[arg(long = "l1-data-cache-hit-rate")]
    pub l1_data_cache_hit_rate: bool,
    /// L1 instruction cache misses
    #[arg(long = "l1-instruction-cache-misses")]
    pub l1_instruction_cache_misses: bool,
    /// Branch miss ratio
    #[arg(long = "branch-miss-ratio")]
    pub branch_miss_ratio: bool,
    /// CPU migrations
    #[arg(long = "cpu-migrations")]
    pub cpu_migrations: bool,
}

impl MetricFlags {
    fn is_set(&self, metric: Metric) -> bool {
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

    /// Selected metrics in canonical order
    pub fn selected(&self) -> Vec<Metric> {
        Metric::ALL.into_iter().filter(|m| self.is_set(*m)).collect()
    }

    /// `None` when no metric was selected
    pub fn perf_report_config(&self) -> Option<PerfReportConfig> {
        let config = PerfReportConfig::from_metrics(self.selected());
        (!config.is_empty()).then_some(config)
    }
}

/// Run the execbench CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if something goes wrong.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the execbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Commands::ExecuteTest {
            ref executor,
            is_async,
            ref metrics,
        } => {
            let config = load_config(cli.config.as_deref())?;
            execute_test(&config, executor.as_deref(), is_async, metrics)
        }
        Commands::Benchmark(ref args) => {
            let config = load_config(cli.config.as_deref())?;
            run_benchmark(config, args)
        }
        Commands::Init { force } => init_config(force),
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins if set.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "execbench=debug"
    } else {
        "execbench=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Already initialised when embedded or called twice
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Explicit path, else discovered execbench.toml, else defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<ExecbenchConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => ExecbenchConfig::discover(),
    };
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            ExecbenchConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => {
            debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            Ok(ExecbenchConfig::default())
        }
    }
}

fn execute_test(
    config: &ExecbenchConfig,
    executor_name: Option<&str>,
    is_async: bool,
    metrics: &MetricFlags,
) -> anyhow::Result<()> {
    config.validate()?;

    let executor_config = match executor_name {
        Some(name) => config.executor(name).with_context(|| {
            let known: Vec<_> = config.executors.iter().map(|e| e.name.as_str()).collect();
            format!("unknown executor `{}` (configured: {})", name, known.join(", "))
        })?,
        None => config
            .executors
            .first()
            .context("no executors configured")?,
    };

    let runner = ProcessRunner::new(config.timeout()?, config.runner.max_output_bytes);
    let mut executor = ProcessExecutor::from_config(
        executor_config,
        &config.runner.test_artifact_path,
        &config.runner.test_name,
        runner,
    );

    let options = TestOptions::new(metrics.perf_report_config(), is_async);
    let result = executor
        .execute(&options)
        .with_context(|| format!("executor `{}` failed", executor_config.name))?;

    if options.perf_report_config.is_some()
        && result.perf_report.as_ref().is_none_or(PerfReport::is_empty)
    {
        warn!(
            executor = %executor_config.name,
            "metrics were requested but none were reported, printing duration"
        );
    }

    println!("{}", sample_value(&result));
    Ok(())
}

fn run_benchmark(mut config: ExecbenchConfig, args: &BenchmarkArgs) -> anyhow::Result<()> {
    // CLI flags override the configuration file
    if let Some(runs) = args.runs {
        config.runner.runs = runs;
    }
    if let Some(path) = &args.test_artifact_path {
        config.runner.test_artifact_path = path.clone();
    }
    if let Some(name) = &args.test_name {
        config.runner.test_name = name.clone();
    }
    config.validate()?;

    let format: OutputFormat = args
        .format
        .as_deref()
        .unwrap_or(config.output.format.as_str())
        .parse::<OutputFormat>()
        .map_err(anyhow::Error::msg)?;

    let timeout = config.timeout()?;
    let runner = ProcessRunner::new(timeout, config.runner.max_output_bytes);
    let executors: Vec<Box<dyn TestExecutor>> = config
        .executors
        .iter()
        .map(|executor_config| {
            Box::new(ProcessExecutor::from_config(
                executor_config,
                &config.runner.test_artifact_path,
                &config.runner.test_name,
                runner.clone(),
            )) as Box<dyn TestExecutor>
        })
        .collect();

    let selected = args.metrics.selected();
    let configurations = if selected.is_empty() {
        MetricConfiguration::defaults()
    } else {
        MetricConfiguration::selection(selected)
    };

    let mut matrix = BenchmarkMatrix::new(configurations, executors)
        .with_progress(std::io::stderr().is_terminal());
    info!(
        cells = matrix.cell_count(),
        runs = config.runner.runs,
        test = %config.runner.test_name,
        "starting benchmark matrix"
    );

    let start = Instant::now();
    let results = matrix
        .run(config.runner.runs)
        .context("benchmark run failed")?;
    info!(
        elapsed_s = start.elapsed().as_secs_f64(),
        "benchmark matrix complete"
    );

    let output = match format {
        OutputFormat::Csv => generate_csv_report(&results)?,
        OutputFormat::Json => {
            let meta = build_report_meta(ReportConfig {
                runs: config.runner.runs,
                timeout_ms: timeout.as_millis() as u64,
                test_artifact_path: config.runner.test_artifact_path.clone(),
                test_name: config.runner.test_name.clone(),
                executors: matrix.executor_names(),
            });
            generate_json_report(&Report {
                meta,
                results: results.clone(),
            })?
        }
        OutputFormat::Human => format_human_output(&results),
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if let Some(ref csv_path) = config.output.csv_path {
        save_csv_report(Path::new(csv_path), &results)
            .with_context(|| format!("failed to save CSV to {}", csv_path))?;
        info!(path = %csv_path, "CSV table saved");
    }

    Ok(())
}

fn init_config(force: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(&path, ExecbenchConfig::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
