//! Selection Vector Model
//!
//! A selection vector holds the per-discipline stringency level of a project.
//! It is computed upstream from screening parameters and is read-only here:
//! a re-screening produces a new vector rather than mutating an existing one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TailoringError};

/// Highest stringency level a discipline can carry
pub const MAX_LEVEL: u8 = 6;

/// Per-discipline stringency levels of one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>", into = "BTreeMap<String, u8>")]
pub struct SelectionVector {
    levels: BTreeMap<String, u8>,
}

/// A discipline whose level differs between two vectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub discipline: String,
    pub before: u8,
    pub after: u8,
}

impl fmt::Display for LevelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.discipline, self.before, self.after)
    }
}

impl SelectionVector {
    /// Creates a vector from `(discipline, level)` pairs, rejecting levels above 6
    pub fn new<I, S>(levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (discipline, level) in levels {
            let discipline = discipline.into();
            if level > MAX_LEVEL {
                return Err(TailoringError::InvalidLevel { discipline, level });
            }
            map.insert(discipline, level);
        }
        Ok(Self { levels: map })
    }

    /// Level for a discipline; disciplines absent from the vector read as 0
    pub fn level(&self, discipline: &str) -> u8 {
        self.levels.get(discipline).copied().unwrap_or(0)
    }

    /// True when the discipline is at or above `required`
    pub fn meets(&self, discipline: &str, required: u8) -> bool {
        self.level(discipline) >= required
    }

    /// True when the discipline is exactly at `required`
    pub fn matches_exactly(&self, discipline: &str, required: u8) -> bool {
        self.level(discipline) == required
    }

    /// Lists every discipline whose level differs from `other`.
    ///
    /// Disciplines present on only one side compare against 0.
    pub fn compare(&self, other: &SelectionVector) -> Vec<LevelChange> {
        let mut disciplines: Vec<&String> = self.levels.keys().chain(other.levels.keys()).collect();
        disciplines.sort();
        disciplines.dedup();

        disciplines
            .into_iter()
            .filter_map(|d| {
                let before = self.level(d);
                let after = other.level(d);
                (before != after).then(|| LevelChange {
                    discipline: d.clone(),
                    before,
                    after,
                })
            })
            .collect()
    }

    /// Iterates `(discipline, level)` in discipline order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.levels.iter().map(|(d, l)| (d.as_str(), *l))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl TryFrom<BTreeMap<String, u8>> for SelectionVector {
    type Error = TailoringError;

    fn try_from(levels: BTreeMap<String, u8>) -> Result<Self> {
        Self::new(levels)
    }
}

impl From<SelectionVector> for BTreeMap<String, u8> {
    fn from(vector: SelectionVector) -> Self {
        vector.levels
    }
}

impl fmt::Display for SelectionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(d, l)| format!("{}:{}", d, l)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
