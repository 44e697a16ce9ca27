//! Summary Statistics
//!
//! Computes the per-cell summary from a sample:
//! - Mean and median over all observations
//! - Min and max from the sorted extremes
//! - Population standard deviation (divides by `n`, not `n - 1`)
//!
//! The mean is clamped into `[min, max]`: floating-point summation can land a
//! few ulps outside the extremes, e.g. a constant sample of `0.1` whose sum
//! divided by `n` is not exactly `0.1`. Comparisons are used instead of
//! `f64::clamp`, which panics on NaN bounds. The standard deviation is taken
//! around the clamped mean.
//!
//! The input slice is never reordered; a sorted copy is used, and every
//! reduction runs over that copy so the result does not depend on input order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while aggregating a sample
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// No observations
    #[error("cannot aggregate an empty sample")]
    EmptySample,

    /// More observations than a `u32` run count holds
    #[error("sample of {0} observations exceeds the supported run count")]
    TooManySamples(usize),
}

/// Summary of one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkStats {
    /// Number of observations
    pub runs: u32,
    /// Arithmetic mean
    pub mean: f64,
    /// Middle element, or the mean of the two central elements
    pub median: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Aggregate a non-empty sample
pub fn aggregate(sample: &[f64]) -> Result<BenchmarkStats, StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample);
    }
    let runs = u32::try_from(sample.len()).map_err(|_| StatsError::TooManySamples(sample.len()))?;

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    // Rounding in the sum can push the mean a few ulps past the extremes
    let raw_mean = sorted.iter().sum::<f64>() / n as f64;
    let mean = if raw_mean < min {
        min
    } else if raw_mean > max {
        max
    } else {
        raw_mean
    };

    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    Ok(BenchmarkStats {
        runs,
        mean,
        median,
        min,
        max,
        std_dev,
    })
}
