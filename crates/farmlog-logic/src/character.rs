//! Character identity as seen by the recorder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest item level the roster accepts.
pub const MAX_ILVL: u32 = 1500;

/// A registered character. `name` is the roster key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub spec: String,
    pub ilvl: u32,
}

impl Character {
    pub fn new(name: impl Into<String>, spec: impl Into<String>, ilvl: u32) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            ilvl,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.ilvl)
    }
}
