//! Catalog Tree Model
//!
//! Construction-time validation, lookup and traversal over the chapter tree.
//! The tailoring transform assumes a validated tree and does not re-check
//! numbering or position uniqueness itself.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{Result, TailoringError};
use crate::models::{Catalog, Chapter, Requirement};

/// Orders dotted chapter numbers segment by segment ("1.10" after "1.9").
///
/// Numeric segments compare as numbers, anything else lexically; a number
/// sorts before its own sub-chapters.
pub fn compare_chapter_numbers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u32>(), r.parse::<u32>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// True when `child` is `parent` plus exactly one non-empty segment
pub fn is_direct_child_number(parent: &str, child: &str) -> bool {
    child
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('.'))
        .map_or(false, |segment| !segment.is_empty() && !segment.contains('.'))
}

fn is_top_level_number(number: &str) -> bool {
    !number.is_empty() && !number.contains('.')
}

impl Chapter {
    /// Adds a sub-chapter, keeping children in natural number order
    pub fn add_chapter(&mut self, child: Chapter) -> Result<()> {
        if !is_direct_child_number(&self.number, &child.number) {
            return Err(TailoringError::StructuralViolation(format!(
                "chapter {} does not extend parent chapter {}",
                child.number, self.number
            )));
        }
        if self.chapters.iter().any(|c| c.number == child.number) {
            return Err(TailoringError::StructuralViolation(format!(
                "duplicate chapter number {}",
                child.number
            )));
        }
        child.validate()?;

        let index = self
            .chapters
            .iter()
            .position(|c| compare_chapter_numbers(&c.number, &child.number) == Ordering::Greater)
            .unwrap_or(self.chapters.len());
        self.chapters.insert(index, child);
        Ok(())
    }

    /// Appends a master requirement after checking its position and identifiers
    pub fn add_requirement(&mut self, requirement: Requirement) -> Result<()> {
        self.check_requirement(&requirement)?;
        if self.requirement(&requirement.position).is_some() {
            return Err(TailoringError::StructuralViolation(format!(
                "duplicate requirement position {} in chapter {}",
                requirement.position, self.number
            )));
        }
        self.requirements.push(requirement);
        Ok(())
    }

    fn check_requirement(&self, requirement: &Requirement) -> Result<()> {
        if requirement.position.trim().is_empty() {
            return Err(TailoringError::StructuralViolation(format!(
                "empty requirement position in chapter {}",
                self.number
            )));
        }
        if requirement.identifiers.is_empty() {
            return Err(TailoringError::StructuralViolation(format!(
                "requirement {}{} has no identifiers",
                self.number, requirement.position
            )));
        }
        if let Some(identifier) = requirement
            .identifiers
            .iter()
            .find(|i| i.level > crate::vector::MAX_LEVEL)
        {
            return Err(TailoringError::InvalidLevel {
                discipline: identifier.discipline.clone(),
                level: identifier.level,
            });
        }
        Ok(())
    }

    /// Checks the whole subtree as a master catalog chapter
    pub fn validate(&self) -> Result<()> {
        let mut positions = HashSet::new();
        for requirement in &self.requirements {
            self.check_requirement(requirement)?;
            if !positions.insert(requirement.position.as_str()) {
                return Err(TailoringError::StructuralViolation(format!(
                    "duplicate requirement position {} in chapter {}",
                    requirement.position, self.number
                )));
            }
        }

        let mut numbers = HashSet::new();
        for child in &self.chapters {
            if !is_direct_child_number(&self.number, &child.number) {
                return Err(TailoringError::StructuralViolation(format!(
                    "chapter {} does not extend parent chapter {}",
                    child.number, self.number
                )));
            }
            if !numbers.insert(child.number.as_str()) {
                return Err(TailoringError::StructuralViolation(format!(
                    "duplicate chapter number {}",
                    child.number
                )));
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Finds this chapter or a descendant by number
    pub fn find_chapter(&self, number: &str) -> Option<&Chapter> {
        if self.number == number {
            return Some(self);
        }
        self.chapters
            .iter()
            .filter(|c| number.starts_with(c.number.as_str()))
            .find_map(|c| c.find_chapter(number))
    }

    pub fn find_chapter_mut(&mut self, number: &str) -> Option<&mut Chapter> {
        if self.number == number {
            return Some(self);
        }
        self.chapters
            .iter_mut()
            .filter(|c| number.starts_with(c.number.as_str()))
            .find_map(|c| c.find_chapter_mut(number))
    }

    /// Gets a requirement of this chapter (not of sub-chapters) by position
    pub fn requirement(&self, position: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.position == position)
    }

    pub fn requirement_mut(&mut self, position: &str) -> Option<&mut Requirement> {
        self.requirements.iter_mut().find(|r| r.position == position)
    }

    /// Visits every requirement of the subtree in document order:
    /// a chapter's own requirements first, then its sub-chapters in order.
    pub fn for_each_requirement<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Chapter, &'a Requirement),
    {
        for requirement in &self.requirements {
            visit(self, requirement);
        }
        for child in &self.chapters {
            child.for_each_requirement(visit);
        }
    }

    /// Mutable counterpart of [`Chapter::for_each_requirement`]
    pub fn for_each_requirement_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&str, &mut Requirement),
    {
        for requirement in &mut self.requirements {
            visit(&self.number, requirement);
        }
        for child in &mut self.chapters {
            child.for_each_requirement_mut(visit);
        }
    }

    /// `(chapter number, requirement)` pairs in document order
    pub fn requirements_in_order(&self) -> Vec<(&str, &Requirement)> {
        let mut out = Vec::new();
        self.for_each_requirement(&mut |chapter, req| out.push((chapter.number.as_str(), req)));
        out
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
            + self
                .chapters
                .iter()
                .map(|c| c.requirement_count())
                .sum::<usize>()
    }

    pub fn selected_count(&self) -> usize {
        self.requirements.iter().filter(|r| r.is_selected()).count()
            + self.chapters.iter().map(|c| c.selected_count()).sum::<usize>()
    }

    /// Copy of the subtree holding only selected requirements.
    ///
    /// Chapters left without any selected requirement are dropped; `None`
    /// when nothing in the subtree is selected.
    pub fn applicable(&self) -> Option<Chapter> {
        let requirements: Vec<Requirement> = self
            .requirements
            .iter()
            .filter(|r| r.is_selected())
            .cloned()
            .collect();
        let chapters: Vec<Chapter> = self.chapters.iter().filter_map(|c| c.applicable()).collect();

        if requirements.is_empty() && chapters.is_empty() {
            return None;
        }
        Some(Chapter {
            number: self.number.clone(),
            name: self.name.clone(),
            chapters,
            requirements,
        })
    }
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chapters: Vec::new(),
            drds: Vec::new(),
        }
    }

    /// Adds a validated top-level chapter in natural number order
    pub fn add_chapter(&mut self, chapter: Chapter) -> Result<()> {
        if !is_top_level_number(&chapter.number) {
            return Err(TailoringError::StructuralViolation(format!(
                "top-level chapter number {} must have exactly one segment",
                chapter.number
            )));
        }
        if self.chapters.iter().any(|c| c.number == chapter.number) {
            return Err(TailoringError::StructuralViolation(format!(
                "duplicate chapter number {}",
                chapter.number
            )));
        }
        chapter.validate()?;

        let index = self
            .chapters
            .iter()
            .position(|c| compare_chapter_numbers(&c.number, &chapter.number) == Ordering::Greater)
            .unwrap_or(self.chapters.len());
        self.chapters.insert(index, chapter);
        Ok(())
    }

    /// Rejects structural violations anywhere in the catalog
    pub fn validate(&self) -> Result<()> {
        let mut numbers = HashSet::new();
        for chapter in &self.chapters {
            if !is_top_level_number(&chapter.number) {
                return Err(TailoringError::StructuralViolation(format!(
                    "top-level chapter number {} must have exactly one segment",
                    chapter.number
                )));
            }
            if !numbers.insert(chapter.number.as_str()) {
                return Err(TailoringError::StructuralViolation(format!(
                    "duplicate chapter number {}",
                    chapter.number
                )));
            }
            chapter.validate()?;
        }

        let mut drds = HashSet::new();
        for drd in &self.drds {
            if !drds.insert(drd.number.as_str()) {
                return Err(TailoringError::StructuralViolation(format!(
                    "duplicate DRD number {}",
                    drd.number
                )));
            }
        }
        Ok(())
    }

    /// Finds a chapter anywhere in the catalog
    pub fn find_chapter(&self, number: &str) -> Option<&Chapter> {
        self.chapters.iter().find_map(|c| c.find_chapter(number))
    }

    pub fn requirement_count(&self) -> usize {
        self.chapters.iter().map(|c| c.requirement_count()).sum()
    }
}
