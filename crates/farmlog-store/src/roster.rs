//! Character roster backed by `characters.csv` (`name,spec,ilvl`).
//!
//! The recorder only reads the roster, through [`Roster`]. Edits go through
//! [`RosterStore`], which rewrites the file on every change.

use std::path::{Path, PathBuf};

use farmlog_logic::character::MAX_ILVL;
use farmlog_logic::Character;

use crate::error::{StoreError, StoreResult};
use crate::table::{self, Columns};

const HEADER: [&str; 3] = ["name", "spec", "ilvl"];

/// Read access to registered characters.
pub trait Roster {
    fn get(&self, name: &str) -> Option<&Character>;

    /// Characters in registration order.
    fn list(&self) -> &[Character];

    fn is_empty(&self) -> bool {
        self.list().is_empty()
    }
}

#[derive(Debug)]
pub struct RosterStore {
    path: PathBuf,
    characters: Vec<Character>,
    specs: Option<Vec<String>>,
}

impl RosterStore {
    /// Load the roster at `path`. A missing file is an empty roster.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let characters = match table::read(&path)? {
            None => Vec::new(),
            Some(t) => {
                let columns = Columns::resolve(&t, &HEADER, &path)?;
                let mut characters: Vec<Character> = Vec::with_capacity(t.rows.len());
                for row in &t.rows {
                    let ilvl = columns.get(row, "ilvl");
                    let ilvl = parse_ilvl(ilvl).ok_or_else(|| {
                        StoreError::malformed(&path, row.line, format!("bad ilvl '{ilvl}'"))
                    })?;
                    let character =
                        Character::new(columns.get(row, "name"), columns.get(row, "spec"), ilvl);
                    // Names are unique; a repeated name keeps its first slot and its last row.
                    match characters.iter_mut().find(|c| c.name == character.name) {
                        Some(existing) => {
                            log::warn!(
                                "Line {}: repeated character '{}', keeping the later row",
                                row.line,
                                character.name
                            );
                            *existing = character;
                        }
                        None => characters.push(character),
                    }
                }
                characters
            }
        };
        log::debug!("Opened roster with {} characters", characters.len());
        Ok(Self {
            path,
            characters,
            specs: None,
        })
    }

    /// Restrict `add` to the given specs.
    pub fn with_specs(mut self, specs: &[String]) -> Self {
        self.specs = Some(specs.to_vec());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a character. Re-adding an identical row is a no-op.
    pub fn add(&mut self, character: Character) -> StoreResult<()> {
        if character.ilvl > MAX_ILVL {
            return Err(StoreError::IlvlOutOfRange(character.ilvl));
        }
        if let Some(specs) = &self.specs {
            if !specs.contains(&character.spec) {
                return Err(StoreError::UnknownSpec(character.spec));
            }
        }
        match self.get(&character.name) {
            Some(existing) if *existing == character => return Ok(()),
            Some(_) => return Err(StoreError::DuplicateCharacter(character.name)),
            None => {}
        }

        let mut characters = self.characters.clone();
        characters.push(character);
        self.commit(characters)?;
        log::info!("Registered {}", self.characters[self.characters.len() - 1]);
        Ok(())
    }

    pub fn update_ilvl(&mut self, name: &str, ilvl: u32) -> StoreResult<()> {
        if ilvl > MAX_ILVL {
            return Err(StoreError::IlvlOutOfRange(ilvl));
        }
        let idx = self.index_of(name)?;
        let mut characters = self.characters.clone();
        characters[idx].ilvl = ilvl;
        self.commit(characters)?;
        log::info!("Updated {}", self.characters[idx]);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> StoreResult<Character> {
        let idx = self.index_of(name)?;
        let removed = self.characters[idx].clone();
        let mut characters = self.characters.clone();
        characters.retain(|c| c.name != name);
        self.commit(characters)?;
        log::info!("Deleted {}", removed);
        Ok(removed)
    }

    /// Characters sorted by item level, highest first.
    pub fn list_by_ilvl(&self) -> Vec<&Character> {
        let mut sorted: Vec<_> = self.characters.iter().collect();
        sorted.sort_by(|a, b| b.ilvl.cmp(&a.ilvl));
        sorted
    }

    fn index_of(&self, name: &str) -> StoreResult<usize> {
        self.characters
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| StoreError::CharacterNotFound(name.to_string()))
    }

    /// Persist `characters`, then adopt them as the in-memory table.
    fn commit(&mut self, characters: Vec<Character>) -> StoreResult<()> {
        let rows: Vec<Vec<String>> = characters
            .iter()
            .map(|c| vec![c.name.clone(), c.spec.clone(), c.ilvl.to_string()])
            .collect();
        table::write(&self.path, &HEADER, &rows)?;
        self.characters = characters;
        Ok(())
    }
}

impl Roster for RosterStore {
    fn get(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    fn list(&self) -> &[Character] {
        &self.characters
    }
}

/// Item levels written by older tools may carry a trailing `.0`.
fn parse_ilvl(s: &str) -> Option<u32> {
    s.parse::<u32>()
        .ok()
        .or_else(|| s.strip_suffix(".0").and_then(|n| n.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open_in(dir: &tempfile::TempDir) -> RosterStore {
        RosterStore::open(dir.path().join("characters.csv")).unwrap()
    }

    #[test]
    fn test_add_get_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir);
        assert!(roster.is_empty());

        roster.add(Character::new("Aerin", "Bard", 1340)).unwrap();
        roster.add(Character::new("Kor", "Berserker", 1415)).unwrap();
        assert_eq!(roster.get("Kor").unwrap().ilvl, 1415);

        let reopened = open_in(&dir);
        assert_eq!(reopened.list(), roster.list());
    }

    #[test]
    fn test_identical_add_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir);
        roster.add(Character::new("Aerin", "Bard", 1340)).unwrap();
        roster.add(Character::new("Aerin", "Bard", 1340)).unwrap();
        assert_eq!(roster.list().len(), 1);
    }

    #[test]
    fn test_conflicting_add_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir);
        roster.add(Character::new("Aerin", "Bard", 1340)).unwrap();
        let err = roster.add(Character::new("Aerin", "Bard", 1400)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCharacter(name) if name == "Aerin"));
    }

    #[test]
    fn test_spec_and_ilvl_checks() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir).with_specs(&["Bard".to_string()]);
        assert!(matches!(
            roster.add(Character::new("Kor", "Berserker", 1100)),
            Err(StoreError::UnknownSpec(_))
        ));
        assert!(matches!(
            roster.add(Character::new("Aerin", "Bard", 1600)),
            Err(StoreError::IlvlOutOfRange(1600))
        ));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir);
        roster.add(Character::new("Aerin", "Bard", 1340)).unwrap();
        roster.add(Character::new("Kor", "Berserker", 1415)).unwrap();

        roster.update_ilvl("Aerin", 1460).unwrap();
        assert_eq!(open_in(&dir).get("Aerin").unwrap().ilvl, 1460);

        let removed = roster.delete("Kor").unwrap();
        assert_eq!(removed.name, "Kor");
        assert!(open_in(&dir).get("Kor").is_none());

        assert!(matches!(
            roster.update_ilvl("Kor", 1500),
            Err(StoreError::CharacterNotFound(_))
        ));
        assert!(matches!(roster.delete("Kor"), Err(StoreError::CharacterNotFound(_))));
    }

    #[test]
    fn test_list_by_ilvl() {
        let dir = tempfile::tempdir().unwrap();
        let mut roster = open_in(&dir);
        roster.add(Character::new("Low", "Bard", 1100)).unwrap();
        roster.add(Character::new("High", "Bard", 1460)).unwrap();
        roster.add(Character::new("Mid", "Bard", 1340)).unwrap();
        let names: Vec<_> = roster.list_by_ilvl().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["High", "Mid", "Low"]);
    }

    #[test]
    fn test_repeated_name_collapses_to_later_row() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("characters.csv"),
            "name,spec,ilvl\nAerin,Bard,1340\nKor,Berserker,1415\nAerin,Bard,1400\n",
        )
        .unwrap();
        let mut roster = open_in(&dir);
        let names: Vec<_> = roster.list().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Aerin", "Kor"]);
        assert_eq!(roster.get("Aerin").unwrap().ilvl, 1400);

        roster.update_ilvl("Aerin", 1445).unwrap();
        assert_eq!(open_in(&dir).get("Aerin").unwrap().ilvl, 1445);

        let removed = roster.delete("Aerin").unwrap();
        assert_eq!(removed.ilvl, 1445);
        assert!(roster.get("Aerin").is_none());
        let reopened = open_in(&dir);
        assert!(reopened.get("Aerin").is_none());
        assert_eq!(reopened.list().len(), 1);
    }

    #[test]
    fn test_reads_float_ilvl() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("characters.csv"), "name,spec,ilvl\nAerin,Bard,1340.0\n").unwrap();
        assert_eq!(open_in(&dir).get("Aerin").unwrap().ilvl, 1340);
    }
}
