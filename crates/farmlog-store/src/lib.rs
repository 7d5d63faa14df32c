//! Flat-file persistence and the submission pipeline for farmlog.
//!
//! Everything here is synchronous and assumes a single writer. Each store
//! loads its file once, serves reads from memory, and rewrites the whole file
//! on every change.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | `appdata.json` loading and the data directory layout |
//! | [`ledger`] | Per-family append-only history ledgers |
//! | [`recorder`] | Roster → resolver → deltas → records → ledger |
//! | [`roster`] | Character roster (`characters.csv`) |
//! | [`schema`] | Ledger columns and record flattening |
//! | [`table`] | CSV reading and whole-file writes |

pub mod config;
pub mod error;
pub mod ledger;
pub mod recorder;
pub mod roster;
pub mod schema;
pub mod table;

pub use config::{AppConfig, ConfigError, DataDir};
pub use error::{StoreError, StoreResult};
pub use ledger::{Histories, Ledger};
pub use recorder::{Accepted, OverLeveledNotice, RecordError, Recorder, Submission};
pub use roster::{Roster, RosterStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything loaded from one data root at startup.
#[derive(Debug)]
pub struct Session {
    pub dir: DataDir,
    pub config: AppConfig,
    pub roster: RosterStore,
    pub histories: Histories,
}

impl Session {
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, OpenError> {
        let dir = DataDir::new(root);
        let config = AppConfig::load(dir.app_data())?;
        Self::with_config(dir, config)
    }

    /// Open the roster and ledgers under `dir` with an already-loaded config.
    pub fn with_config(dir: DataDir, config: AppConfig) -> Result<Self, OpenError> {
        let roster = RosterStore::open(dir.characters())?.with_specs(&config.specs);
        let histories = Histories::open(&dir)?;
        Ok(Self {
            dir,
            config,
            roster,
            histories,
        })
    }

    pub fn recorder(&mut self) -> Recorder<'_, RosterStore> {
        Recorder::new(&self.config, &self.roster, &mut self.histories)
    }
}
