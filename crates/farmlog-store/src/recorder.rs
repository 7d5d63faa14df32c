//! The submission pipeline: roster → tier resolver → delta engine → record
//! assembly → ledger append.
//!
//! A submission either appends its full set of records or appends nothing.
//! Every check that can reject it runs before the ledger is touched.

use farmlog_logic::{
    assemble_records, compute_deltas, resolve, ActivityDetails, ActivityRecord, AssemblyError,
    DeltaError, EligibilityVerdict, Snapshot, TierError, Timestamp,
};
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::ledger::Histories;
use crate::roster::Roster;

/// One completed run as entered by the user.
#[derive(Debug, Clone)]
pub struct Submission {
    pub character: String,
    pub details: ActivityDetails,
    /// Start snapshot first, then one per floor or the end snapshot.
    pub snapshots: Vec<Snapshot>,
}

/// Non-blocking: the run was recorded, but below the character's best tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverLeveledNotice {
    pub message: String,
    pub max_eligible_tier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Accepted {
    pub records: Vec<ActivityRecord>,
    pub verdict: EligibilityVerdict,
    pub notice: Option<OverLeveledNotice>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("please register a character first")]
    NoCharacters,

    #[error("character '{0}' is not registered")]
    MissingRosterEntry(String),

    #[error("{message}")]
    IneligibleTier {
        message: String,
        verdict: EligibilityVerdict,
    },

    #[error("{family} takes {expected} checkpoints, got {found}")]
    CheckpointCount {
        family: String,
        expected: &'static str,
        found: usize,
    },

    #[error(transparent)]
    Tier(#[from] TierError),

    #[error(transparent)]
    Delta(#[from] DeltaError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Recorder<'a, R: Roster> {
    config: &'a AppConfig,
    roster: &'a R,
    histories: &'a mut Histories,
}

impl<'a, R: Roster> Recorder<'a, R> {
    pub fn new(config: &'a AppConfig, roster: &'a R, histories: &'a mut Histories) -> Self {
        Self {
            config,
            roster,
            histories,
        }
    }

    /// Check a tier choice without recording anything.
    pub fn check(&self, character: &str, details: &ActivityDetails) -> Result<EligibilityVerdict, RecordError> {
        if self.roster.is_empty() {
            return Err(RecordError::NoCharacters);
        }
        let character = self
            .roster
            .get(character)
            .ok_or_else(|| RecordError::MissingRosterEntry(character.to_string()))?;
        let tiers = self.config.tiers(details.family());
        Ok(resolve(character.ilvl, tiers, details.dimension())?)
    }

    pub fn submit(&mut self, submission: Submission) -> Result<Accepted, RecordError> {
        self.submit_at(submission, Timestamp::now())
    }

    /// [`Recorder::submit`] with an explicit timestamp.
    pub fn submit_at(&mut self, submission: Submission, timestamp: Timestamp) -> Result<Accepted, RecordError> {
        let Submission {
            character,
            details,
            snapshots,
        } = submission;
        let family = details.family();

        let verdict = self.check(&character, &details)?;
        let roster = self.roster;
        let character = roster
            .get(&character)
            .ok_or_else(|| RecordError::MissingRosterEntry(character.clone()))?;

        if !verdict.eligible {
            let message = verdict.message(character).unwrap_or_default();
            log::warn!("Blocked submission: {}", message);
            return Err(RecordError::IneligibleTier { message, verdict });
        }

        if !family.accepts_checkpoints(snapshots.len()) {
            return Err(RecordError::CheckpointCount {
                family: family.to_string(),
                expected: if family.is_multi_segment() {
                    "at least 2"
                } else {
                    "exactly 2"
                },
                found: snapshots.len(),
            });
        }

        let segments = compute_deltas(&snapshots, family.categories())?;
        for (i, segment) in segments.iter().enumerate() {
            let negative = segment.negative_categories();
            if !negative.is_empty() {
                log::debug!("Segment {} has negative gains for {:?}", i + 1, negative);
            }
        }

        let records = assemble_records(character, &verdict, details, segments, timestamp)?;
        self.histories.append(family, records.clone())?;

        let notice = if verdict.at_level() {
            None
        } else {
            let message = verdict.message(character).unwrap_or_default();
            log::warn!("{}", message);
            Some(OverLeveledNotice {
                message,
                max_eligible_tier: verdict.max_eligible_tier.clone(),
            })
        };

        Ok(Accepted {
            records,
            verdict,
            notice,
        })
    }
}
