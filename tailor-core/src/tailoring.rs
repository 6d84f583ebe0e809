//! Tailoring Transform
//!
//! Derives a project copy of the master catalog in which every requirement
//! carries a selection, and provides the manual edits allowed on that copy
//! afterwards: bulk (re)selection of a chapter subtree, single requirement
//! updates and insertion of new requirements.
//!
//! The master catalog is only ever borrowed; every tailored tree owns its own
//! data, so edits to one project can never reach the master or another
//! project.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::applicability::requirement_selected;
use crate::error::{Result, TailoringError};
use crate::models::{
    Catalog, Chapter, Drd, Identifier, Phase, ProjectProfile, Requirement, Selection,
};

/// Deep copy of `master` with the selection of every requirement derived
/// from `profile`
pub fn tailor_chapter(master: &Chapter, profile: &ProjectProfile) -> Chapter {
    Chapter {
        number: master.number.clone(),
        name: master.name.clone(),
        chapters: master
            .chapters
            .iter()
            .map(|c| tailor_chapter(c, profile))
            .collect(),
        requirements: master
            .requirements
            .iter()
            .map(|r| tailor_requirement(r, profile))
            .collect(),
    }
}

fn tailor_requirement(master: &Requirement, profile: &ProjectProfile) -> Requirement {
    let mut copy = master.clone();
    copy.selection = Some(Selection::derived(requirement_selected(master, profile)));
    copy
}

/// Tailors a whole catalog for one project
pub fn tailor(catalog: &Catalog, profile: &ProjectProfile) -> TailoredCatalog {
    let chapters: Vec<Chapter> = catalog
        .chapters
        .iter()
        .map(|c| tailor_chapter(c, profile))
        .collect();

    let tailored = TailoredCatalog {
        id: Uuid::new_v4(),
        catalog_name: catalog.name.clone(),
        catalog_version: catalog.version.clone(),
        tailored_at: Utc::now(),
        profile: profile.clone(),
        chapters,
        drds: catalog.drds.clone(),
    };

    for chapter in &tailored.chapters {
        debug!(
            "Chapter {}: {}/{} requirements selected",
            chapter.number,
            chapter.selected_count(),
            chapter.requirement_count()
        );
    }
    info!(
        "Tailored {} {} for '{}': {}/{} requirements selected (vector {})",
        tailored.catalog_name,
        tailored.catalog_version,
        profile.name,
        tailored.selected_count(),
        tailored.requirement_count(),
        profile.vector
    );

    tailored
}

/// Sets the selection of every requirement in the subtree rooted at
/// `chapter` to `desired`, in document order.
///
/// This is a manual override: the applicability predicate is not consulted
/// and every touched requirement is stamped as overridden. Returns the
/// number of requirements touched.
pub fn set_selected_for_chapter_subtree(chapter: &mut Chapter, desired: bool) -> usize {
    let stamp = Selection::manual(desired);
    let mut touched = 0;
    chapter.for_each_requirement_mut(&mut |_, req| {
        req.selection = Some(stamp);
        touched += 1;
    });
    touched
}

/// Fields of a project requirement that may be replaced by hand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementUpdate {
    pub text: Option<String>,
    pub selected: Option<bool>,
}

/// Replaces the provided fields of the requirement at `position`.
///
/// Fails with `RequirementNotFound` if the chapter has no such position;
/// nothing is created implicitly.
pub fn update_requirement<'a>(
    chapter: &'a mut Chapter,
    position: &str,
    update: RequirementUpdate,
) -> Result<&'a Requirement> {
    let number = chapter.number.clone();
    let requirement = chapter
        .requirement_mut(position)
        .ok_or_else(|| TailoringError::RequirementNotFound {
            chapter: number,
            position: position.to_string(),
        })?;

    if let Some(text) = update.text {
        requirement.text = text;
    }
    if let Some(selected) = update.selected {
        requirement.selection = Some(Selection::manual(selected));
    }
    Ok(requirement)
}

/// Content of a requirement added to a project copy by hand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRequirement {
    pub text: String,
    pub phases: BTreeSet<Phase>,
    pub drd_references: BTreeSet<String>,
    pub identifiers: Vec<Identifier>,
}

impl NewRequirement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// First position `<predecessor><n>` (n = 1, 2, ...) not used in the chapter
pub fn next_position_after(chapter: &Chapter, predecessor: &str) -> String {
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{}{}", predecessor, suffix);
        if chapter.requirement(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

/// Inserts a new requirement directly after `predecessor` and returns its
/// synthesized position.
///
/// The predecessor must exist in the chapter. The new requirement is
/// selected and marked as a manual change; every other requirement keeps
/// its position and order.
pub fn insert_requirement(
    chapter: &mut Chapter,
    predecessor: &str,
    new: NewRequirement,
) -> Result<String> {
    let index = chapter
        .requirements
        .iter()
        .position(|r| r.position == predecessor)
        .ok_or_else(|| TailoringError::RequirementNotFound {
            chapter: chapter.number.clone(),
            position: predecessor.to_string(),
        })?;

    let position = next_position_after(chapter, predecessor);
    let requirement = Requirement {
        position: position.clone(),
        text: new.text,
        phases: new.phases,
        drd_references: new.drd_references,
        identifiers: new.identifiers,
        selection: Some(Selection::manual(true)),
    };
    chapter.requirements.insert(index + 1, requirement);

    debug!("Inserted requirement {}{}", chapter.number, position);
    Ok(position)
}

/// Project-specific snapshot produced by a tailoring run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TailoredCatalog {
    pub id: Uuid,

    pub catalog_name: String,

    pub catalog_version: String,

    pub tailored_at: DateTime<Utc>,

    /// Inputs the selection was derived from
    pub profile: ProjectProfile,

    pub chapters: Vec<Chapter>,

    /// DRD definitions copied from the master catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drds: Vec<Drd>,
}

impl TailoredCatalog {
    /// Runs a fresh tailoring of `catalog` for a new profile, e.g. after
    /// re-screening. Manual overrides on this snapshot are not carried over.
    /// Callers report the vector differences themselves via
    /// `SelectionVector::compare`.
    pub fn retailor(&self, catalog: &Catalog, profile: &ProjectProfile) -> TailoredCatalog {
        debug!(
            "Re-tailoring snapshot {} ({} manual override(s) dropped)",
            self.id,
            self.overridden_count()
        );
        tailor(catalog, profile)
    }

    pub fn find_chapter(&self, number: &str) -> Option<&Chapter> {
        self.chapters.iter().find_map(|c| c.find_chapter(number))
    }

    pub fn find_chapter_mut(&mut self, number: &str) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find_map(|c| c.find_chapter_mut(number))
    }

    fn chapter_mut_or_err(&mut self, number: &str) -> Result<&mut Chapter> {
        self.find_chapter_mut(number)
            .ok_or_else(|| TailoringError::ChapterNotFound(number.to_string()))
    }

    /// Bulk override of a chapter subtree looked up by number
    pub fn set_selected_for_chapter(&mut self, number: &str, desired: bool) -> Result<usize> {
        let chapter = self.chapter_mut_or_err(number)?;
        let touched = set_selected_for_chapter_subtree(chapter, desired);
        info!(
            "Set {} requirement(s) under chapter {} to selected={}",
            touched, number, desired
        );
        Ok(touched)
    }

    /// Updates one requirement looked up by chapter number and position
    pub fn update_requirement(
        &mut self,
        chapter: &str,
        position: &str,
        update: RequirementUpdate,
    ) -> Result<&Requirement> {
        let chapter = self.chapter_mut_or_err(chapter)?;
        update_requirement(chapter, position, update)
    }

    /// Inserts a requirement into a chapter looked up by number
    pub fn insert_requirement(
        &mut self,
        chapter: &str,
        predecessor: &str,
        new: NewRequirement,
    ) -> Result<String> {
        let chapter = self.chapter_mut_or_err(chapter)?;
        insert_requirement(chapter, predecessor, new)
    }

    pub fn requirement_count(&self) -> usize {
        self.chapters.iter().map(|c| c.requirement_count()).sum()
    }

    pub fn selected_count(&self) -> usize {
        self.chapters.iter().map(|c| c.selected_count()).sum()
    }

    /// Number of requirements whose selection was changed by hand
    pub fn overridden_count(&self) -> usize {
        let mut count = 0;
        for chapter in &self.chapters {
            chapter.for_each_requirement(&mut |_, req| {
                if req.selection.map_or(false, |s| s.is_overridden()) {
                    count += 1;
                }
            });
        }
        count
    }
}
