//! Configuration loading from execbench.toml
//!
//! The configuration is discovered by walking up from the current directory.
//! Every field has a default, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name searched for by [`ExecbenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "execbench.toml";

/// execbench configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecbenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Executors under comparison, in matrix order
    #[serde(default = "default_executors")]
    pub executors: Vec<ExecutorConfig>,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ExecbenchConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            executors: default_executors(),
            output: OutputConfig::default(),
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Invocations per matrix cell
    #[serde(default = "default_runs")]
    pub runs: u32,
    /// Wall-clock ceiling per invocation (e.g., "30s", "1h")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Ceiling on captured executor stdout
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Compiled test artifact handed to every executor
    #[serde(default = "default_test_artifact_path")]
    pub test_artifact_path: String,
    /// Test selected inside the artifact
    #[serde(default = "default_test_name")]
    pub test_name: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            timeout: default_timeout(),
            max_output_bytes: default_max_output_bytes(),
            test_artifact_path: default_test_artifact_path(),
            test_name: default_test_name(),
        }
    }
}

fn default_runs() -> u32 {
    27
}
fn default_timeout() -> String {
    "1h".to_string()
}
fn default_max_output_bytes() -> usize {
    100 * 1024 * 1024
}
fn default_test_artifact_path() -> String {
    "contracts/Avg_Unit_Test.json".to_string()
}
fn default_test_name() -> String {
    "test_Avg_OneOperandEvenTheOtherOdd()".to_string()
}

/// One executor: a command plus an argument template.
///
/// `{artifact}` and `{test}` in `args` are replaced by the runner's test
/// artifact path and test name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Identity reported in results
    pub name: String,
    /// Program to launch
    pub command: String,
    /// Arguments placed before the subcommand
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExecutorConfig {
    /// Arguments with placeholders substituted
    pub fn resolve_args(&self, artifact: &str, test: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{artifact}", artifact).replace("{test}", test))
            .collect()
    }
}

fn default_executors() -> Vec<ExecutorConfig> {
    vec![
        ExecutorConfig {
            name: "napi".to_string(),
            command: "node".to_string(),
            args: vec![
                "execute-test.mjs".to_string(),
                "{artifact}".to_string(),
                "{test}".to_string(),
            ],
        },
        ExecutorConfig {
            name: "native".to_string(),
            command: "target/release/execute-test".to_string(),
            args: vec![
                "--test-artifact-path".to_string(),
                "{artifact}".to_string(),
                "--test-name".to_string(),
                "{test}".to_string(),
            ],
        },
    ]
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "csv"
    #[serde(default = "default_format")]
    pub format: String,
    /// Also persist the CSV table here after every benchmark run
    #[serde(default)]
    pub csv_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            csv_path: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl ExecbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find `execbench.toml` by walking up from the current directory
    pub fn discover() -> Option<PathBuf> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.runner.runs == 0 {
            anyhow::bail!("runner.runs must be at least 1");
        }
        if self.runner.max_output_bytes == 0 {
            anyhow::bail!("runner.max_output_bytes must be at least 1");
        }
        if self.executors.is_empty() {
            anyhow::bail!("at least one [[executors]] entry is required");
        }
        for (i, executor) in self.executors.iter().enumerate() {
            if self.executors[..i].iter().any(|e| e.name == executor.name) {
                anyhow::bail!("duplicate executor name: {}", executor.name);
            }
        }
        self.timeout()?;
        Ok(())
    }

    /// Parsed `runner.timeout`
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        let nanos = Self::parse_duration(&self.runner.timeout)?;
        if nanos == 0 {
            anyhow::bail!("runner.timeout must be positive");
        }
        Ok(Duration::from_nanos(nanos))
    }

    /// Look up an executor by name
    pub fn executor(&self, name: &str) -> Option<&ExecutorConfig> {
        self.executors.iter().find(|e| e.name == name)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# execbench Configuration

[runner]
# Invocations per matrix cell
runs = 27
# Wall-clock ceiling per invocation
timeout = "1h"
# Ceiling on captured executor stdout
max_output_bytes = 104857600
# Test handed to every executor
test_artifact_path = "contracts/Avg_Unit_Test.json"
test_name = "test_Avg_OneOperandEvenTheOtherOdd()"

# Executors in matrix order. {artifact} and {test} are substituted.
[[executors]]
name = "napi"
command = "node"
args = ["execute-test.mjs", "{artifact}", "{test}"]

[[executors]]
name = "native"
command = "target/release/execute-test"
args = ["--test-artifact-path", "{artifact}", "--test-name", "{test}"]

[output]
# Default output format: human, json, csv
format = "human"
# Persist the CSV table after each run (uncomment to enable)
# csv_path = "target/execbench/results.csv"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "1h") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration number: {}", num_part));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
