//! Append-only history ledgers, one CSV file per activity family.
//!
//! A [`Ledger`] keeps the whole table in memory and rewrites the file on
//! every append. There is no locking: with two writers on the same file, the
//! later rewrite drops the other writer's rows.

use std::path::{Path, PathBuf};

use farmlog_logic::{ActivityFamily, ActivityRecord};

use crate::config::DataDir;
use crate::error::{StoreError, StoreResult};
use crate::schema::{ledger_header, record_from_row, record_to_row};
use crate::table::{self, Columns};

#[derive(Debug)]
pub struct Ledger {
    family: ActivityFamily,
    path: PathBuf,
    records: Vec<ActivityRecord>,
}

impl Ledger {
    /// Load the ledger at `path`. A missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>, family: ActivityFamily) -> StoreResult<Self> {
        let path = path.into();
        let records = match table::read(&path)? {
            None => Vec::new(),
            Some(t) => {
                let columns = Columns::resolve(&t, &ledger_header(family), &path)?;
                t.rows
                    .iter()
                    .map(|row| {
                        record_from_row(family, &columns, row)
                            .map_err(|message| StoreError::malformed(&path, row.line, message))
                    })
                    .collect::<StoreResult<Vec<_>>>()?
            }
        };
        log::debug!("Opened {} ledger with {} records", family, records.len());
        Ok(Self {
            family,
            path,
            records,
        })
    }

    pub fn family(&self) -> ActivityFamily {
        self.family
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in append order. For display; records are never edited.
    pub fn read_all(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append `records` after the existing ones and rewrite the file.
    ///
    /// Either every record is written or none is: the family and schema of
    /// each new record are checked before anything touches the disk, and the
    /// in-memory table only changes after the write succeeds. Duplicates are
    /// kept. An empty batch leaves the file alone.
    pub fn append(&mut self, records: Vec<ActivityRecord>) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(r) = records.iter().find(|r| r.details.family() != self.family) {
            return Err(StoreError::FamilyMismatch {
                expected: self.family,
                found: r.details.family(),
            });
        }

        let rows = self
            .records
            .iter()
            .chain(&records)
            .map(record_to_row)
            .collect::<StoreResult<Vec<_>>>()?;
        table::write(&self.path, &ledger_header(self.family), &rows)?;

        log::info!(
            "Appended {} {} record(s), ledger now {}",
            records.len(),
            self.family,
            self.len() + records.len()
        );
        self.records.extend(records);
        Ok(())
    }
}

/// The three family ledgers under one data root.
#[derive(Debug)]
pub struct Histories {
    aura_of_resonance: Ledger,
    infinite_grind: Ledger,
    guardian_raid: Ledger,
}

impl Histories {
    pub fn open(dir: &DataDir) -> StoreResult<Self> {
        let open = |family| Ledger::open(dir.history(family), family);
        Ok(Self {
            aura_of_resonance: open(ActivityFamily::ChaosAuraOfResonance)?,
            infinite_grind: open(ActivityFamily::ChaosInfiniteGrind)?,
            guardian_raid: open(ActivityFamily::GuardianRaid)?,
        })
    }

    pub fn ledger(&self, family: ActivityFamily) -> &Ledger {
        match family {
            ActivityFamily::ChaosAuraOfResonance => &self.aura_of_resonance,
            ActivityFamily::ChaosInfiniteGrind => &self.infinite_grind,
            ActivityFamily::GuardianRaid => &self.guardian_raid,
        }
    }

    pub fn ledger_mut(&mut self, family: ActivityFamily) -> &mut Ledger {
        match family {
            ActivityFamily::ChaosAuraOfResonance => &mut self.aura_of_resonance,
            ActivityFamily::ChaosInfiniteGrind => &mut self.infinite_grind,
            ActivityFamily::GuardianRaid => &mut self.guardian_raid,
        }
    }

    pub fn read_all(&self, family: ActivityFamily) -> &[ActivityRecord] {
        self.ledger(family).read_all()
    }

    /// Append to the ledger matching the records' family.
    pub fn append(&mut self, family: ActivityFamily, records: Vec<ActivityRecord>) -> StoreResult<()> {
        self.ledger_mut(family).append(records)
    }
}
