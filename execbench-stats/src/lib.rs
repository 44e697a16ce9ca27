#![warn(missing_docs)]
//! execbench Statistical Engine
//!
//! Reduces a sample of scalar observations to the summary reported for each
//! matrix cell:
//! - Central tendency (mean, median)
//! - Extremes (min, max)
//! - Dispersion (population standard deviation)
//!
//! No outlier rejection is applied; every observation contributes.

mod summary;

pub use summary::{BenchmarkStats, StatsError, aggregate};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let stats = aggregate(&[1.0]).unwrap();
        assert_eq!(stats.runs, 1);
        assert!(matches!(aggregate(&[]), Err(StatsError::EmptySample)));
    }
}
