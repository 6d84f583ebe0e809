use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::TailoringError;
use crate::vector::SelectionVector;

/// Lifecycle phase of a project
///
/// Declaration order is the phase order used for sorting and reporting.
/// Deserialization goes through `FromStr`, so files may spell phases in any
/// case and write phase zero as a bare `0`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    #[serde(rename = "ZERO")]
    Zero,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Phase {
    /// All phases in lifecycle order
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Zero,
            Phase::A,
            Phase::B,
            Phase::C,
            Phase::D,
            Phase::E,
            Phase::F,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Zero => write!(f, "ZERO"),
            Phase::A => write!(f, "A"),
            Phase::B => write!(f, "B"),
            Phase::C => write!(f, "C"),
            Phase::D => write!(f, "D"),
            Phase::E => write!(f, "E"),
            Phase::F => write!(f, "F"),
        }
    }
}

impl FromStr for Phase {
    type Err = TailoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ZERO" | "0" => Ok(Phase::Zero),
            "A" => Ok(Phase::A),
            "B" => Ok(Phase::B),
            "C" => Ok(Phase::C),
            "D" => Ok(Phase::D),
            "E" => Ok(Phase::E),
            "F" => Ok(Phase::F),
            _ => Err(TailoringError::UnknownPhase(s.to_string())),
        }
    }
}

struct PhaseVisitor;

impl<'de> Visitor<'de> for PhaseVisitor {
    type Value = Phase;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a phase: ZERO (or 0), A, B, C, D, E or F")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Phase, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Phase, E> {
        match v {
            0 => Ok(Phase::Zero),
            _ => Err(E::custom(TailoringError::UnknownPhase(v.to_string()))),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Phase, E> {
        match v {
            0 => Ok(Phase::Zero),
            _ => Err(E::custom(TailoringError::UnknownPhase(v.to_string()))),
        }
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PhaseVisitor)
    }
}

/// One applicability rule attached to a requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    /// Discipline code (e.g. "Q" for quality, "S" for safety)
    pub discipline: String,

    /// Minimum stringency level; 0 applies regardless of the vector
    pub level: u8,

    /// Screening tags that narrow this rule; empty means unconditional
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub limitations: BTreeSet<String>,
}

impl Identifier {
    /// Creates an unconditional identifier
    pub fn new(discipline: impl Into<String>, level: u8) -> Self {
        Self {
            discipline: discipline.into(),
            level,
            limitations: BTreeSet::new(),
        }
    }

    /// Creates an identifier limited to the given screening tags
    pub fn limited<I, S>(discipline: impl Into<String>, level: u8, limitations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            discipline: discipline.into(),
            level,
            limitations: limitations.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.discipline, self.level)?;
        if !self.limitations.is_empty() {
            let tags: Vec<&str> = self.limitations.iter().map(|s| s.as_str()).collect();
            write!(f, " [{}]", tags.join(", "))?;
        }
        Ok(())
    }
}

/// Selection state of a requirement on a project copy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub selected: bool,

    /// Set when the selection was changed by hand after tailoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden_at: Option<DateTime<Utc>>,
}

impl Selection {
    /// Selection as derived by the tailoring transform
    pub fn derived(selected: bool) -> Self {
        Self {
            selected,
            overridden_at: None,
        }
    }

    /// Selection set by hand, stamped with the current time
    pub fn manual(selected: bool) -> Self {
        Self {
            selected,
            overridden_at: Some(Utc::now()),
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden_at.is_some()
    }
}

/// A single requirement within a catalog chapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Position within the owning chapter (e.g. "a", "a1")
    pub position: String,

    /// Requirement text
    pub text: String,

    /// Phases the requirement applies to; empty means all phases
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub phases: BTreeSet<Phase>,

    /// Numbers of the DRDs this requirement calls for
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub drd_references: BTreeSet<String>,

    /// Applicability rules
    #[serde(default)]
    pub identifiers: Vec<Identifier>,

    /// Only present on project copies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

impl Requirement {
    /// Creates a requirement without phases, DRDs or identifiers
    pub fn new(position: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            text: text.into(),
            phases: BTreeSet::new(),
            drd_references: BTreeSet::new(),
            identifiers: Vec::new(),
            selection: None,
        }
    }

    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.push(identifier);
        self
    }

    pub fn with_phases<I: IntoIterator<Item = Phase>>(mut self, phases: I) -> Self {
        self.phases.extend(phases);
        self
    }

    pub fn with_drd(mut self, number: impl Into<String>) -> Self {
        self.drd_references.insert(number.into());
        self
    }

    /// Whether the requirement is selected; master requirements never are
    pub fn is_selected(&self) -> bool {
        self.selection.map_or(false, |s| s.selected)
    }
}

/// A numbered chapter of the catalog tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    /// Dotted chapter number (e.g. "5.2.1")
    pub number: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
}

impl Chapter {
    /// Creates an empty chapter
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            chapters: Vec::new(),
            requirements: Vec::new(),
        }
    }
}

/// Document Requirements Definition: a deliverable tied to milestones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Drd {
    pub number: String,

    pub title: String,

    #[serde(default)]
    pub action: String,

    /// Raw `;`-delimited milestone list (e.g. "SRR; PDR")
    #[serde(default)]
    pub due_milestones: String,
}

impl Drd {
    pub fn new(
        number: impl Into<String>,
        title: impl Into<String>,
        due_milestones: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            action: String::new(),
            due_milestones: due_milestones.into(),
        }
    }
}

impl fmt::Display for Drd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.title)
    }
}

/// Master catalog of one standards baseline version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub name: String,

    pub version: String,

    /// Top-level chapters in document order
    #[serde(default)]
    pub chapters: Vec<Chapter>,

    /// DRD definitions shipped with the catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drds: Vec<Drd>,
}

/// Explicit inputs of one project's tailoring
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectProfile {
    #[serde(default)]
    pub name: String,

    /// Phases active for the project
    #[serde(default)]
    pub phases: BTreeSet<Phase>,

    /// Stringency levels derived from screening
    #[serde(default)]
    pub vector: SelectionVector,

    /// Tags extracted from the screening sheet
    #[serde(default)]
    pub screening_tags: BTreeSet<String>,
}

impl ProjectProfile {
    pub fn new<P: IntoIterator<Item = Phase>>(phases: P, vector: SelectionVector) -> Self {
        Self {
            name: String::new(),
            phases: phases.into_iter().collect(),
            vector,
            screening_tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.screening_tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Qualified reference to a requirement: chapter number plus position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequirementRef {
    pub chapter: String,
    pub position: String,
}

impl RequirementRef {
    pub fn new(chapter: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            chapter: chapter.into(),
            position: position.into(),
        }
    }
}

impl fmt::Display for RequirementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.chapter, self.position)
    }
}
