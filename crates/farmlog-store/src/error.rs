//! Store error types.

use std::path::{Path, PathBuf};

use farmlog_logic::character::MAX_ILVL;
use farmlog_logic::ActivityFamily;
use thiserror::Error;

/// Store result type.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row that cannot be read back into a record or character.
    #[error("{}:{line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: missing column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("a {found} record cannot be appended to the {expected} ledger")]
    FamilyMismatch {
        expected: ActivityFamily,
        found: ActivityFamily,
    },

    /// A record whose gains or floor do not fit its family's columns.
    #[error("record does not match the {family} schema: {message}")]
    SchemaMismatch {
        family: ActivityFamily,
        message: String,
    },

    #[error("character '{0}' is already registered with different data")]
    DuplicateCharacter(String),

    #[error("character '{0}' not found")]
    CharacterNotFound(String),

    #[error("unknown spec '{0}'")]
    UnknownSpec(String),

    #[error("ilvl {0} is outside 0..={max}", max = MAX_ILVL)]
    IlvlOutOfRange(u32),
}

impl StoreError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }
}
