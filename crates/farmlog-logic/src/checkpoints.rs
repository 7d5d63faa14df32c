//! Checkpoint delta engine.
//!
//! A run is recorded as a series of resource-count snapshots: one at the
//! start, then one after each floor or at the end. Each pair of consecutive
//! snapshots is a segment, and its delta is the gain over that span.
//!
//! Deltas are never clamped. A count that went down (usually a typo while
//! entering numbers) shows up as a negative gain and is recorded as such.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    #[error("need at least 2 snapshots, got {0}")]
    TooFewSnapshots(usize),
    #[error("snapshot {index} has no count for '{category}'")]
    MissingCategory { index: usize, category: String },
    #[error("gain for '{category}' over segment {segment} does not fit in 64 bits")]
    Overflow { segment: usize, category: String },
}

/// Resource counts at one point in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot(BTreeMap<String, i64>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<i64> {
        self.0.get(category).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[(S, i64); N]> for Snapshot {
    fn from(pairs: [(S, i64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Gains over one segment, in the category order the engine was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSegment {
    gains: Vec<(String, i64)>,
}

impl DeltaSegment {
    pub fn get(&self, category: &str) -> Option<i64> {
        self.gains
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.gains.iter().map(|(c, v)| (c.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    /// Categories whose count dropped over the segment.
    pub fn negative_categories(&self) -> Vec<&str> {
        self.iter().filter(|(_, v)| *v < 0).map(|(c, _)| c).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for DeltaSegment {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Self {
            gains: iter.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }
}

/// Turn `n` snapshots into `n - 1` per-segment deltas over `categories`.
///
/// Every snapshot must carry every category; a missing count is reported,
/// never filled in.
pub fn compute_deltas<S: AsRef<str>>(
    snapshots: &[Snapshot],
    categories: &[S],
) -> Result<Vec<DeltaSegment>, DeltaError> {
    if snapshots.len() < 2 {
        return Err(DeltaError::TooFewSnapshots(snapshots.len()));
    }

    let count = |index: usize, category: &str| {
        snapshots[index]
            .get(category)
            .ok_or_else(|| DeltaError::MissingCategory {
                index,
                category: category.to_string(),
            })
    };

    (0..snapshots.len() - 1)
        .map(|i| {
            categories
                .iter()
                .map(|c| {
                    let c = c.as_ref();
                    let gain = count(i + 1, c)?
                        .checked_sub(count(i, c)?)
                        .ok_or_else(|| DeltaError::Overflow {
                            segment: i + 1,
                            category: c.to_string(),
                        })?;
                    Ok((c.to_string(), gain))
                })
                .collect::<Result<DeltaSegment, DeltaError>>()
        })
        .collect()
}
