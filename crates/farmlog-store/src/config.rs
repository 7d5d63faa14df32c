//! Application data: activity names, tier tables, valid specs, and where the
//! data files live.
//!
//! The configuration document is JSON and is read once at startup:
//!
//! ```json
//! {
//!   "activities": ["Chaos Dungeon (AoR)", "Chaos Dungeon (Infinite)", "Guardian Raid"],
//!   "bosses":   { "Sonavel": 1415, "Hanumatan": 1460 },
//!   "dungeons": { "Reverie I": 1415, "Reverie II": 1445 },
//!   "specs":    ["Bard", "Berserker"]
//! }
//! ```
//!
//! `activities` names the three families positionally, in
//! [`ActivityFamily::ALL`] order. Tier tables keep their JSON key order.

use std::fs;
use std::path::{Path, PathBuf};

use farmlog_logic::{ActivityFamily, TierSource, TierTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid application data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected} activity names, found {0}", expected = ActivityFamily::ALL.len())]
    ActivityCount(usize),
    #[error("activity '{0}' is listed twice")]
    DuplicateActivity(String),
    #[error("no character specs configured")]
    NoSpecs,
    #[error("unknown activity '{0}'")]
    UnknownActivity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub activities: Vec<String>,
    pub bosses: TierTable,
    pub dungeons: TierTable,
    pub specs: Vec<String>,
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::info!(
            "Loaded {}: {} dungeons, {} bosses, {} specs",
            path.display(),
            config.dungeons.len(),
            config.bosses.len(),
            config.specs.len()
        );
        Ok(config)
    }

    /// Tier tables validate themselves on deserialize; this checks the rest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activities.len() != ActivityFamily::ALL.len() {
            return Err(ConfigError::ActivityCount(self.activities.len()));
        }
        for (i, name) in self.activities.iter().enumerate() {
            if self.activities[..i].contains(name) {
                return Err(ConfigError::DuplicateActivity(name.clone()));
            }
        }
        if self.specs.is_empty() {
            return Err(ConfigError::NoSpecs);
        }
        Ok(())
    }

    pub fn family(&self, activity: &str) -> Result<ActivityFamily, ConfigError> {
        self.activities
            .iter()
            .position(|a| a == activity)
            .and_then(|i| ActivityFamily::ALL.get(i).copied())
            .ok_or_else(|| ConfigError::UnknownActivity(activity.to_string()))
    }

    /// Display name of a family as configured.
    pub fn activity_name(&self, family: ActivityFamily) -> &str {
        ActivityFamily::ALL
            .iter()
            .position(|f| *f == family)
            .and_then(|i| self.activities.get(i))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn tiers(&self, family: ActivityFamily) -> &TierTable {
        match family.tier_source() {
            TierSource::Dungeons => &self.dungeons,
            TierSource::Bosses => &self.bosses,
        }
    }

    pub fn is_known_spec(&self, spec: &str) -> bool {
        self.specs.iter().any(|s| s == spec)
    }
}

/// File layout under one data root.
///
/// ```text
/// <root>/appdata.json
/// <root>/characters.csv
/// <root>/histories/{cd_aor,cd_ig,gr}.csv
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn app_data(&self) -> PathBuf {
        self.root.join("appdata.json")
    }

    pub fn characters(&self) -> PathBuf {
        self.root.join("characters.csv")
    }

    pub fn histories(&self) -> PathBuf {
        self.root.join("histories")
    }

    pub fn history(&self, family: ActivityFamily) -> PathBuf {
        self.histories().join(format!("{}.csv", family.ledger_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "activities": ["AoR", "Infinite", "Guardian"],
        "bosses": {"Ur": 100, "Ven": 600},
        "dungeons": {"D1": 100, "D2": 600, "D3": 1100},
        "specs": ["Bard", "Berserker"]
    }"#;

    #[test]
    fn test_parse_sample() {
        let c = AppConfig::from_json(SAMPLE).unwrap();
        assert_eq!(c.dungeons.names().collect::<Vec<_>>(), ["D1", "D2", "D3"]);
        assert_eq!(c.family("Infinite").unwrap(), ActivityFamily::ChaosInfiniteGrind);
        assert_eq!(c.activity_name(ActivityFamily::GuardianRaid), "Guardian");
        assert_eq!(c.tiers(ActivityFamily::GuardianRaid).len(), 2);
        assert_eq!(c.tiers(ActivityFamily::ChaosAuraOfResonance).len(), 3);
        assert!(c.is_known_spec("Bard"));
        assert!(!c.is_known_spec("Paladin"));
    }

    #[test]
    fn test_unknown_activity() {
        let c = AppConfig::from_json(SAMPLE).unwrap();
        assert!(matches!(c.family("Abyss"), Err(ConfigError::UnknownActivity(_))));
    }

    #[test]
    fn test_rejects_wrong_activity_count() {
        let text = SAMPLE.replace(r#""AoR", "#, "");
        assert!(matches!(AppConfig::from_json(&text), Err(ConfigError::ActivityCount(2))));
    }

    #[test]
    fn test_rejects_duplicate_activity() {
        let text = SAMPLE.replace("Guardian", "AoR");
        assert!(matches!(AppConfig::from_json(&text), Err(ConfigError::DuplicateActivity(_))));
    }

    #[test]
    fn test_rejects_unordered_tiers() {
        let text = SAMPLE.replace(r#""D3": 1100"#, r#""D3": 50"#);
        assert!(matches!(AppConfig::from_json(&text), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_rejects_empty_specs() {
        let text = SAMPLE.replace(r#"["Bard", "Berserker"]"#, "[]");
        assert!(matches!(AppConfig::from_json(&text), Err(ConfigError::NoSpecs)));
    }

    #[test]
    fn test_data_dir_layout() {
        let d = DataDir::new("/srv/farmlog");
        assert_eq!(d.app_data(), Path::new("/srv/farmlog/appdata.json"));
        assert_eq!(
            d.history(ActivityFamily::ChaosInfiniteGrind),
            Path::new("/srv/farmlog/histories/cd_ig.csv")
        );
    }
}
