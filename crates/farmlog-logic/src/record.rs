//! Immutable history records and their assembly from resolver + engine output.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::ActivityDetails;
use crate::character::Character;
use crate::checkpoints::DeltaSegment;
use crate::tiers::EligibilityVerdict;

/// Ledger timestamp layout. Sorts lexically in time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Second-resolution wall-clock time, stored in [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Timestamp(String);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(&Local::now().naive_local())
    }

    pub fn from_datetime(at: &NaiveDateTime) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map(|at| Self::from_datetime(&at))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Timestamp {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed run, or one floor of a multi-segment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub timestamp: Timestamp,
    pub character: String,
    /// Item level when the run was recorded, not the roster's current value.
    pub ilvl: u32,
    pub details: ActivityDetails,
    pub at_level: bool,
    /// 1-based floor, only for multi-segment families.
    pub floor: Option<u32>,
    pub gains: DeltaSegment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("cannot record {tier}: requires ilvl {required}")]
    Ineligible { tier: String, required: u32 },
    #[error("verdict is for '{verdict}' but the run was on '{run}'")]
    TierMismatch { verdict: String, run: String },
    #[error("{family} expects {expected} segment(s), got {found}")]
    SegmentCount {
        family: String,
        expected: String,
        found: usize,
    },
}

/// Build the records for one accepted submission.
///
/// Single-segment families take exactly one segment. Multi-segment families
/// take one or more and number them `floor = 1..=n` in order.
pub fn assemble_records(
    character: &Character,
    verdict: &EligibilityVerdict,
    details: ActivityDetails,
    segments: Vec<DeltaSegment>,
    timestamp: Timestamp,
) -> Result<Vec<ActivityRecord>, AssemblyError> {
    if !verdict.eligible {
        return Err(AssemblyError::Ineligible {
            tier: verdict.tier.clone(),
            required: verdict.required_ilvl,
        });
    }
    if verdict.tier != details.dimension() {
        return Err(AssemblyError::TierMismatch {
            verdict: verdict.tier.clone(),
            run: details.dimension().to_string(),
        });
    }

    let family = details.family();
    let multi = family.is_multi_segment();
    let well_formed = if multi {
        !segments.is_empty()
    } else {
        segments.len() == 1
    };
    if !well_formed {
        return Err(AssemblyError::SegmentCount {
            family: family.to_string(),
            expected: if multi { "at least 1" } else { "exactly 1" }.to_string(),
            found: segments.len(),
        });
    }

    let at_level = verdict.at_level();
    Ok(segments
        .into_iter()
        .zip(1u32..)
        .map(|(gains, floor)| ActivityRecord {
            timestamp: timestamp.clone(),
            character: character.name.clone(),
            ilvl: character.ilvl,
            details: details.clone(),
            at_level,
            floor: multi.then_some(floor),
            gains,
        })
        .collect())
}
