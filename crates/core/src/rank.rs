//! Rank estimation against the latest pool distribution.
//!
//! The pool page only reports bucket counts, so a score maps to an interval:
//! everyone in a higher bucket is ahead, and anyone in the same bucket may be.

use serde::{Deserialize, Serialize};

use crate::model::{BUCKET_COUNT, PoolSnapshot};

/// Half-open score ranges `[BOUNDARIES[i], BOUNDARIES[i + 1])` for each bucket.
pub const BOUNDARIES: [i64; BUCKET_COUNT + 1] =
    [0, 301, 351, 361, 371, 381, 391, 401, 411, 421, 431, 441, 451, 601, 1201];

/// Score outside every bucket range. A normal answer to a bad query, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid CRS score: {0}")]
pub struct InvalidScore(pub i64);

/// 1-based competitive rank interval.
///
/// `upper` is the best possible rank, `lower` the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInterval {
    pub lower: u64,
    pub upper: u64,
}

/// Index of the bucket containing `score`.
pub fn bucket_index(score: i64) -> Option<usize> {
    BOUNDARIES.windows(2).position(|w| w[0] <= score && score < w[1])
}

/// Estimate where `score` ranks in the pool described by `snapshot`.
pub fn estimate(score: i64, snapshot: &PoolSnapshot) -> Result<RankInterval, InvalidScore> {
    let index = bucket_index(score).ok_or(InvalidScore(score))?;

    let above: u64 = snapshot.buckets[index + 1..].iter().map(|&n| u64::from(n)).sum();
    let lower = above + u64::from(snapshot.buckets[index]);
    let upper = if index == BUCKET_COUNT - 1 { 1 } else { above + 1 };

    Ok(RankInterval { lower, upper })
}

impl PoolSnapshot {
    /// See [`estimate`].
    pub fn rank_estimate(&self, score: i64) -> Result<RankInterval, InvalidScore> {
        estimate(score, self)
    }
}
