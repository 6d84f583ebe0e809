//! DRD Aggregator
//!
//! Collects the DRDs called for by the requirements of a (tailored) tree,
//! keeps those due in the project phases, and groups the referencing
//! requirements per DRD.
//!
//! Whether unselected requirements count is up to the caller: pass the full
//! tree, or the result of [`Chapter::applicable`] to count selected ones only.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::milestones::is_drd_due;
use crate::models::{Chapter, Drd, Phase, RequirementRef};
use crate::tailoring::TailoredCatalog;

/// Resolves a DRD number to its definition
pub trait DrdRegistry {
    fn lookup(&self, number: &str) -> Option<&Drd>;
}

impl DrdRegistry for HashMap<String, Drd> {
    fn lookup(&self, number: &str) -> Option<&Drd> {
        self.get(number)
    }
}

/// Registry over a fixed list of DRD definitions
#[derive(Debug, Clone, Default)]
pub struct DrdCatalog {
    drds: BTreeMap<String, Drd>,
}

impl DrdCatalog {
    pub fn new<I: IntoIterator<Item = Drd>>(drds: I) -> Self {
        Self {
            drds: drds.into_iter().map(|d| (d.number.clone(), d)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.drds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drds.is_empty()
    }
}

impl DrdRegistry for DrdCatalog {
    fn lookup(&self, number: &str) -> Option<&Drd> {
        self.drds.get(number)
    }
}

/// Which requirements of a tailored catalog count towards the DRD list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrdScope {
    /// Only selected requirements
    #[default]
    Selected,
    /// Every requirement, selected or not
    All,
}

/// A due DRD and the requirements calling for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrdEntry {
    pub drd: Drd,
    pub requirements: BTreeSet<RequirementRef>,
}

/// Due DRDs keyed by DRD number
pub type DrdList = BTreeMap<String, DrdEntry>;

/// Adds the DRDs of one subtree to `list`
fn collect_into(
    chapter: &Chapter,
    project_phases: &BTreeSet<Phase>,
    registry: &dyn DrdRegistry,
    list: &mut DrdList,
) {
    chapter.for_each_requirement(&mut |owner, requirement| {
        for number in &requirement.drd_references {
            let Some(drd) = registry.lookup(number) else {
                warn!(
                    "Requirement {}{} references unknown DRD {}",
                    owner.number, requirement.position, number
                );
                continue;
            };
            if !is_drd_due(&drd.due_milestones, project_phases) {
                continue;
            }
            list.entry(drd.number.clone())
                .or_insert_with(|| DrdEntry {
                    drd: drd.clone(),
                    requirements: BTreeSet::new(),
                })
                .requirements
                .insert(RequirementRef::new(owner.number.clone(), requirement.position.clone()));
        }
    });
}

/// Collects the DRDs due in `project_phases` from every requirement of the
/// subtree. DRDs without a due reference are left out.
pub fn collect_drds(
    chapter: &Chapter,
    project_phases: &BTreeSet<Phase>,
    registry: &dyn DrdRegistry,
) -> DrdList {
    let mut list = DrdList::new();
    collect_into(chapter, project_phases, registry, &mut list);
    list
}

/// DRD list of a whole tailored catalog, using its own phases and DRDs
pub fn collect_catalog_drds(tailored: &TailoredCatalog, scope: DrdScope) -> DrdList {
    let registry = DrdCatalog::new(tailored.drds.iter().cloned());
    let phases = &tailored.profile.phases;
    let mut list = DrdList::new();

    for chapter in &tailored.chapters {
        match scope {
            DrdScope::All => collect_into(chapter, phases, &registry, &mut list),
            DrdScope::Selected => {
                if let Some(applicable) = chapter.applicable() {
                    collect_into(&applicable, phases, &registry, &mut list);
                }
            }
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Catalog, Identifier, ProjectProfile, Requirement};
    use crate::tailoring::tailor;
    use crate::vector::SelectionVector;

    fn registry() -> DrdCatalog {
        DrdCatalog::new([
            Drd::new("SRR-01", "Software requirements specification", "SRR"),
            Drd::new("PDR-02", "Design document", "PDR; CDR"),
            Drd::new("OPS-03", "Operations manual", "ORR"),
            Drd::new("FREE-04", "Progress report", "monthly"),
            Drd::new("NONE-05", "Never due", ""),
        ])
    }

    fn chapter() -> Chapter {
        let mut ch = Chapter::new("6", "Documentation");
        ch.add_requirement(
            Requirement::new("a", "Provide SRS")
                .with_identifier(Identifier::new("W", 1))
                .with_phases([Phase::A])
                .with_drd("SRR-01"),
        )
        .unwrap();
        ch.add_requirement(
            Requirement::new("b", "Provide design")
                .with_identifier(Identifier::new("W", 3))
                .with_drd("PDR-02")
                .with_drd("SRR-01"),
        )
        .unwrap();
        let mut sub = Chapter::new("6.1", "Operations");
        sub.add_requirement(
            Requirement::new("a", "Provide manuals")
                .with_identifier(Identifier::new("W", 1))
                .with_drd("OPS-03")
                .with_drd("FREE-04")
                .with_drd("NONE-05")
                .with_drd("MISSING-99"),
        )
        .unwrap();
        ch.add_chapter(sub).unwrap();
        ch
    }

    fn phases(list: &[Phase]) -> BTreeSet<Phase> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_srr_drd_due_in_phase_a() {
        let list = collect_drds(&chapter(), &phases(&[Phase::A]), &registry());

        let entry = list.get("SRR-01").unwrap();
        assert!(entry.requirements.contains(&RequirementRef::new("6", "a")));
        assert!(entry.requirements.contains(&RequirementRef::new("6", "b")));
        assert_eq!(entry.requirements.len(), 2);
    }

    #[test]
    fn test_not_due_drds_are_omitted() {
        let list = collect_drds(&chapter(), &phases(&[Phase::A]), &registry());
        assert!(!list.contains_key("PDR-02"));
        assert!(!list.contains_key("OPS-03"));
        assert!(!list.contains_key("NONE-05"));
        assert!(!list.contains_key("MISSING-99"));
    }

    #[test]
    fn test_free_form_milestone_always_due() {
        let list = collect_drds(&chapter(), &phases(&[Phase::F]), &registry());
        let keys: Vec<&str> = list.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["FREE-04"]);
        assert_eq!(
            list["FREE-04"].requirements.iter().next().unwrap().to_string(),
            "6.1a"
        );
    }

    #[test]
    fn test_multiple_phases_merge_into_one_entry() {
        let list = collect_drds(&chapter(), &phases(&[Phase::B, Phase::C, Phase::E]), &registry());
        let keys: Vec<&str> = list.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["FREE-04", "OPS-03", "PDR-02"]);
        assert_eq!(list["PDR-02"].requirements.len(), 1);
    }

    #[test]
    fn test_hash_map_registry() {
        let mut map = HashMap::new();
        map.insert("OPS-03".to_string(), Drd::new("OPS-03", "Operations manual", "ORR"));
        let list = collect_drds(&chapter(), &phases(&[Phase::E]), &map);
        assert_eq!(list.len(), 1);
        assert_eq!(list["OPS-03"].drd.title, "Operations manual");
    }

    #[test]
    fn test_catalog_scope_selected_vs_all() {
        let mut catalog = Catalog::new("ECSS-E-ST-40", "C");
        catalog.add_chapter(chapter()).unwrap();
        catalog.drds = registry().drds.into_values().collect();

        let profile = ProjectProfile::new([Phase::A], SelectionVector::new([("W", 1)]).unwrap());
        let tailored = tailor(&catalog, &profile);

        let selected = collect_catalog_drds(&tailored, DrdScope::Selected);
        assert_eq!(
            selected["SRR-01"].requirements.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            vec!["6a"]
        );

        let all = collect_catalog_drds(&tailored, DrdScope::All);
        assert_eq!(all["SRR-01"].requirements.len(), 2);
    }
}
