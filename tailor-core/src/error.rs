//! Error types for tailoring operations

use thiserror::Error;

/// Errors that can occur while building, tailoring or editing a catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TailoringError {
    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Requirement not found: {position} in chapter {chapter}")]
    RequirementNotFound { chapter: String, position: String },

    #[error("Catalog structure violation: {0}")]
    StructuralViolation(String),

    #[error("Invalid level {level} for discipline {discipline} (expected 0-6)")]
    InvalidLevel { discipline: String, level: u8 },

    #[error("Unknown phase: {0}")]
    UnknownPhase(String),
}

pub type Result<T> = std::result::Result<T, TailoringError>;
