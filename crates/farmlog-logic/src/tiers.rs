//! Tier tables and the eligibility resolver.
//!
//! A tier table is an ordered list of `(name, required ilvl)` pairs for one
//! tier source (dungeons or bosses). Table order is authoritative: when two
//! tiers share a requirement, the one listed later counts as the higher tier.
//!
//! [`resolve`] checks a selected tier against a character's item level:
//! - below the requirement → not eligible, the submission must be blocked
//! - eligible but a later tier is also reachable → over-leveled, accepted
//!   with `at_level = false`
//! - eligible and the selected tier is the highest reachable → at level

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One level-gated difficulty variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub required_ilvl: u32,
}

impl Tier {
    pub fn new(name: impl Into<String>, required_ilvl: u32) -> Self {
        Self {
            name: name.into(),
            required_ilvl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("tier table is empty")]
    Empty,
    #[error("tier '{0}' appears more than once")]
    DuplicateTier(String),
    #[error("tier '{tier}' requires {required} but follows a tier requiring {previous}")]
    Unordered {
        tier: String,
        required: u32,
        previous: u32,
    },
    #[error("unknown tier '{0}'")]
    UnknownTier(String),
}

/// Ordered, validated tier list.
///
/// Invariants (checked by [`TierTable::new`]):
/// - at least one tier
/// - requirements non-decreasing in table order
/// - tier names unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, TierError> {
        if tiers.is_empty() {
            return Err(TierError::Empty);
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tiers[..i].iter().any(|t| t.name == tier.name) {
                return Err(TierError::DuplicateTier(tier.name.clone()));
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &tiers[p]) {
                if tier.required_ilvl < prev.required_ilvl {
                    return Err(TierError::Unordered {
                        tier: tier.name.clone(),
                        required: tier.required_ilvl,
                        previous: prev.required_ilvl,
                    });
                }
            }
        }
        Ok(Self { tiers })
    }

    /// Build a table from `(name, required)` pairs in order.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, TierError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, required)| Tier::new(name, required))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false for a constructed table; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The last tier in table order whose requirement is met, if any.
    pub fn highest_eligible(&self, ilvl: u32) -> Option<&Tier> {
        self.tiers
            .iter()
            .fold(None, |best, t| if t.required_ilvl <= ilvl { Some(t) } else { best })
    }
}

// Tables are written as JSON objects (`{"name": ilvl, ...}`), and the object's
// key order is the table order, so (de)serialization walks the map by hand.

impl Serialize for TierTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tiers.len()))?;
        for tier in &self.tiers {
            map.serialize_entry(&tier.name, &tier.required_ilvl)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TierTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TierTableVisitor;

        impl<'de> Visitor<'de> for TierTableVisitor {
            type Value = TierTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of tier name to required item level")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TierTable, A::Error> {
                let mut tiers = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, required_ilvl)) = access.next_entry::<String, u32>()? {
                    tiers.push(Tier {
                        name,
                        required_ilvl,
                    });
                }
                TierTable::new(tiers).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_map(TierTableVisitor)
    }
}

/// Where a character stands relative to a selected tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    AtLevel,
    OverLeveled,
    UnderLeveled,
}

/// Result of checking one selected tier against one character level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub tier: String,
    pub eligible: bool,
    pub required_ilvl: u32,
    pub max_eligible_tier: Option<String>,
    pub is_max_tier: bool,
}

impl EligibilityVerdict {
    pub fn standing(&self) -> Standing {
        match (self.eligible, self.is_max_tier) {
            (false, _) => Standing::UnderLeveled,
            (true, true) => Standing::AtLevel,
            (true, false) => Standing::OverLeveled,
        }
    }

    /// Value recorded in the ledger's `at_level` column.
    pub fn at_level(&self) -> bool {
        self.standing() == Standing::AtLevel
    }

    /// User-facing message for the blocked and over-leveled cases.
    pub fn message(&self, who: &impl fmt::Display) -> Option<String> {
        match self.standing() {
            Standing::AtLevel => None,
            Standing::UnderLeveled => Some(format!(
                "{} ilvl is too low for {} ({})",
                who, self.tier, self.required_ilvl
            )),
            Standing::OverLeveled => Some(format!(
                "Overleveled: {} ({}) is below the highest available for {}",
                self.tier, self.required_ilvl, who
            )),
        }
    }
}

/// Check `selected` against `ilvl`.
///
/// Only an unknown tier name is an error; an ineligible character is a normal
/// verdict with `eligible == false`.
pub fn resolve(ilvl: u32, tiers: &TierTable, selected: &str) -> Result<EligibilityVerdict, TierError> {
    let tier = tiers
        .get(selected)
        .ok_or_else(|| TierError::UnknownTier(selected.to_string()))?;
    let max_eligible_tier = tiers.highest_eligible(ilvl).map(|t| t.name.clone());
    let eligible = ilvl >= tier.required_ilvl;
    let is_max_tier = eligible && max_eligible_tier.as_deref() == Some(selected);

    Ok(EligibilityVerdict {
        tier: tier.name.clone(),
        eligible,
        required_ilvl: tier.required_ilvl,
        max_eligible_tier,
        is_max_tier,
    })
}
