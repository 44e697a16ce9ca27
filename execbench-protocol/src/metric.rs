//! Performance Metrics
//!
//! The fixed, ordered set of counters an executor can report. The order of
//! [`Metric::ALL`] is significant: it is the order flags are emitted in, the
//! order matrix rows are enumerated in, and the precedence used when a result
//! carries more than one metric.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named performance-counter observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Retired instructions
    Instructions,
    /// Retired instructions divided by CPU cycles
    InstructionsPerCycle,
    /// `1 - misses / references` for the last level cache
    LastLevelCacheHitRate,
    /// `1 - misses / reads` for the L1 data cache
    L1DataCacheHitRate,
    /// L1 instruction cache read misses
    L1InstructionCacheMisses,
    /// Branch misses divided by branch instructions
    BranchMissRatio,
    /// Number of times the process moved between CPUs
    CpuMigrations,
}

impl Metric {
    /// All metrics in precedence order
    pub const ALL: [Metric; 7] = [
        Metric::Instructions,
        Metric::InstructionsPerCycle,
        Metric::LastLevelCacheHitRate,
        Metric::L1DataCacheHitRate,
        Metric::L1InstructionCacheMisses,
        Metric::BranchMissRatio,
        Metric::CpuMigrations,
    ];

    /// Field name in the executor's JSON output
    pub fn wire_name(self) -> &'static str {
        match self {
            Metric::Instructions => "instructions",
            Metric::InstructionsPerCycle => "instructionsPerCycle",
            Metric::LastLevelCacheHitRate => "lastLevelCacheHitRate",
            Metric::L1DataCacheHitRate => "l1DataCacheHitRate",
            Metric::L1InstructionCacheMisses => "l1InstructionCacheMisses",
            Metric::BranchMissRatio => "branchMissRatio",
            Metric::CpuMigrations => "cpuMigrations",
        }
    }

    /// Long flag passed to the executor to enable this metric
    pub fn flag(self) -> &'static str {
        match self {
            Metric::Instructions => "--instructions",
            Metric::InstructionsPerCycle => "--instructions-per-cycle",
            Metric::LastLevelCacheHitRate => "--last-level-cache-hit-rate",
            Metric::L1DataCacheHitRate => "--l1-data-cache-hit-rate",
            Metric::L1InstructionCacheMisses => "--l1-instruction-cache-misses",
            Metric::BranchMissRatio => "--branch-miss-ratio",
            Metric::CpuMigrations => "--cpu-migrations",
        }
    }

    /// Name used for this metric's rows in benchmark reports
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Instructions => "Instructions",
            Metric::InstructionsPerCycle => "InstructionsPerCycle",
            Metric::LastLevelCacheHitRate => "LastLevelCacheHitRate",
            Metric::L1DataCacheHitRate => "L1DataCacheHitRate",
            Metric::L1InstructionCacheMisses => "L1InstructionCacheMisses",
            Metric::BranchMissRatio => "BranchMissRatio",
            Metric::CpuMigrations => "CpuMigrations",
        }
    }

}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
