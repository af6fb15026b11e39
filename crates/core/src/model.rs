//! Draw history domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of score buckets in the pool distribution.
pub const BUCKET_COUNT: usize = 14;

/// Lower-bound label of each pool bucket, lowest bucket first.
pub const BUCKET_LABELS: [&str; BUCKET_COUNT] =
    ["0", "300", "350", "360", "370", "380", "390", "400", "410", "420", "430", "440", "450", "600"];

/// Whether a draw was open to the whole pool or restricted to a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramScope {
    General,
    ProgramSpecific,
}

impl ProgramScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramScope::General => "general",
            ProgramScope::ProgramSpecific => "program_specific",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, ProgramScope::General)
    }
}

impl fmt::Display for ProgramScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(ProgramScope::General),
            "program_specific" => Ok(ProgramScope::ProgramSpecific),
            other => Err(format!("unknown program scope: {other}")),
        }
    }
}

/// One round of invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Round identifier, e.g. `"120"` or `"91A"`.
    pub round: String,
    /// Draw date. Normalized (`"Jan 5, 2022"`) once it reaches the store.
    pub date: String,
    /// CRS score of the lowest-ranked candidate invited.
    pub score: u32,
    pub invitations: u32,
    pub program_scope: ProgramScope,
}

/// Score distribution of the candidate pool on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub date: String,
    /// Candidate counts per bucket, lowest score bucket first.
    pub buckets: [u32; BUCKET_COUNT],
    /// Grand total as reported by the page. It can lag the bucket sum, so it
    /// is kept as reported instead of being recomputed.
    pub total: u32,
}

impl PoolSnapshot {
    /// Sum of all bucket counts.
    pub fn bucket_sum(&self) -> u64 {
        self.buckets.iter().map(|&n| u64::from(n)).sum()
    }

    /// Bucket counts paired with their lower-bound labels, lowest first.
    pub fn labeled_buckets(&self) -> Vec<(&'static str, u32)> {
        BUCKET_LABELS.iter().copied().zip(self.buckets.iter().copied()).collect()
    }
}
