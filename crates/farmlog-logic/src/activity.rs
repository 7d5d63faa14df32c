//! Activity families and their fixed field schemas.
//!
//! Each family has its own resource categories, bonus flags, tier source and
//! ledger. [`ActivityDetails`] carries the per-run fields as one variant per
//! family so that no call site has to assemble loose field sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource categories tracked per family, in ledger column order.
pub mod categories {
    pub const AURA_OF_RESONANCE: &[&str] = &["red", "blue", "leapstones", "greater_leapstones", "shards"];
    pub const INFINITE_GRIND: &[&str] = &["currency_orbs", "currency_shards", "red", "blue"];
    pub const GUARDIAN_RAID: &[&str] = &["red", "blue", "leapstones", "greater_leapstones"];
}

/// Which tier table gates a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierSource {
    Dungeons,
    Bosses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActivityFamily {
    /// Chaos dungeon run with Aura of Resonance: start and end counts.
    ChaosAuraOfResonance,
    /// Chaos dungeon grind: start counts plus one snapshot per floor.
    ChaosInfiniteGrind,
    /// Guardian raid: start and end counts.
    GuardianRaid,
}

impl ActivityFamily {
    /// All families, in the order the configuration lists their names.
    pub const ALL: [ActivityFamily; 3] = [
        ActivityFamily::ChaosAuraOfResonance,
        ActivityFamily::ChaosInfiniteGrind,
        ActivityFamily::GuardianRaid,
    ];

    pub fn categories(self) -> &'static [&'static str] {
        match self {
            ActivityFamily::ChaosAuraOfResonance => categories::AURA_OF_RESONANCE,
            ActivityFamily::ChaosInfiniteGrind => categories::INFINITE_GRIND,
            ActivityFamily::GuardianRaid => categories::GUARDIAN_RAID,
        }
    }

    pub fn tier_source(self) -> TierSource {
        match self {
            ActivityFamily::ChaosAuraOfResonance | ActivityFamily::ChaosInfiniteGrind => {
                TierSource::Dungeons
            }
            ActivityFamily::GuardianRaid => TierSource::Bosses,
        }
    }

    /// Ledger column holding the tier name.
    pub fn dimension_column(self) -> &'static str {
        match self.tier_source() {
            TierSource::Dungeons => "dungeon",
            TierSource::Bosses => "boss",
        }
    }

    /// Multi-segment families emit one record per floor.
    pub fn is_multi_segment(self) -> bool {
        matches!(self, ActivityFamily::ChaosInfiniteGrind)
    }

    /// Whether a run with `n` snapshots is well-formed for this family.
    pub fn accepts_checkpoints(self, n: usize) -> bool {
        if self.is_multi_segment() {
            n >= 2
        } else {
            n == 2
        }
    }

    /// Stem of the family's ledger file.
    pub fn ledger_name(self) -> &'static str {
        match self {
            ActivityFamily::ChaosAuraOfResonance => "cd_aor",
            ActivityFamily::ChaosInfiniteGrind => "cd_ig",
            ActivityFamily::GuardianRaid => "gr",
        }
    }
}

impl fmt::Display for ActivityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityFamily::ChaosAuraOfResonance => "Chaos Dungeon (Aura of Resonance)",
            ActivityFamily::ChaosInfiniteGrind => "Chaos Dungeon (Infinite Grind)",
            ActivityFamily::GuardianRaid => "Guardian Raid",
        })
    }
}

/// Bonus floor rolled during an Aura of Resonance run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusFloor {
    #[default]
    None,
    Boss,
    Treasure,
}

impl BonusFloor {
    pub fn as_str(self) -> &'static str {
        match self {
            BonusFloor::None => "None",
            BonusFloor::Boss => "Boss",
            BonusFloor::Treasure => "Treasure",
        }
    }
}

impl FromStr for BonusFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" | "" => Ok(BonusFloor::None),
            "Boss" => Ok(BonusFloor::Boss),
            "Treasure" => Ok(BonusFloor::Treasure),
            other => Err(format!("unknown bonus floor '{other}'")),
        }
    }
}

impl fmt::Display for BonusFloor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run fields that depend on the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityDetails {
    ChaosAuraOfResonance {
        dungeon: String,
        rested: bool,
        bonus_floor: BonusFloor,
    },
    ChaosInfiniteGrind {
        dungeon: String,
        bonus_floor: bool,
    },
    GuardianRaid {
        boss: String,
        rested: bool,
        first_time: bool,
    },
}

impl ActivityDetails {
    pub fn family(&self) -> ActivityFamily {
        match self {
            ActivityDetails::ChaosAuraOfResonance { .. } => ActivityFamily::ChaosAuraOfResonance,
            ActivityDetails::ChaosInfiniteGrind { .. } => ActivityFamily::ChaosInfiniteGrind,
            ActivityDetails::GuardianRaid { .. } => ActivityFamily::GuardianRaid,
        }
    }

    /// The dungeon or boss this run was gated on.
    pub fn dimension(&self) -> &str {
        match self {
            ActivityDetails::ChaosAuraOfResonance { dungeon, .. }
            | ActivityDetails::ChaosInfiniteGrind { dungeon, .. } => dungeon.as_str(),
            ActivityDetails::GuardianRaid { boss, .. } => boss.as_str(),
        }
    }
}
