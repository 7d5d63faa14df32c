//! Pure run-tracking logic for farmlog.
//!
//! This crate contains everything that decides *what* gets recorded, and
//! nothing that decides *where*. Functions take plain data and return
//! results, so they are unit-testable without touching the filesystem.
//! Persistence lives in `farmlog-store`.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`activity`] | Activity families, resource categories, bonus flags |
//! | [`character`] | Character identity and item level |
//! | [`checkpoints`] | Snapshot → per-segment delta engine |
//! | [`record`] | Immutable history records and their assembly |
//! | [`tiers`] | Tier tables and the eligibility resolver |

pub mod activity;
pub mod character;
pub mod checkpoints;
pub mod record;
pub mod tiers;

pub use activity::{ActivityDetails, ActivityFamily, BonusFloor, TierSource};
pub use character::Character;
pub use checkpoints::{compute_deltas, DeltaError, DeltaSegment, Snapshot};
pub use record::{assemble_records, ActivityRecord, AssemblyError, Timestamp};
pub use tiers::{resolve, EligibilityVerdict, Standing, Tier, TierError, TierTable};
