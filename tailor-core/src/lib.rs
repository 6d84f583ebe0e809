pub mod applicability;
pub mod catalog;
pub mod config;
pub mod drd;
pub mod error;
pub mod export;
pub mod milestones;
pub mod models;
pub mod storage;
pub mod tailoring;
pub mod vector;

// Re-export commonly used types
pub use applicability::{is_selected, requirement_selected};
pub use catalog::compare_chapter_numbers;
pub use config::{get_config_path, OutputFormat, TailorConfig};
pub use drd::{
    collect_catalog_drds, collect_drds, DrdCatalog, DrdEntry, DrdList, DrdRegistry, DrdScope,
};
pub use error::{Result, TailoringError};
pub use export::{selection_report, ChapterSummary};
pub use milestones::{due_phases, is_drd_due, milestones_for};
pub use models::{
    Catalog, Chapter, Drd, Identifier, Phase, ProjectProfile, Requirement, RequirementRef,
    Selection,
};
pub use storage::{load_catalog, load_profile, load_snapshot, Storage};
pub use tailoring::{
    insert_requirement, set_selected_for_chapter_subtree, tailor, tailor_chapter,
    update_requirement, NewRequirement, RequirementUpdate, TailoredCatalog,
};
pub use vector::{LevelChange, SelectionVector, MAX_LEVEL};
