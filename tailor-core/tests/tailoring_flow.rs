use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use std::thread;

use tailor_core::{
    collect_catalog_drds, collect_drds, load_catalog, load_profile, tailor, DrdCatalog, DrdScope,
    NewRequirement, Phase, ProjectProfile, RequirementRef, RequirementUpdate, SelectionVector,
    Storage, TailoredCatalog,
};
use tempfile::TempDir;

const CATALOG: &str = r#"
name: ECSS-Q-ST-80
version: C Rev.1
chapters:
  - number: "5"
    name: Software product assurance programme
    requirements:
      - position: a
        text: The supplier shall establish a software PA plan.
        identifiers:
          - discipline: Q
            level: 0
        drd_references: [SPAP]
      - position: b
        text: The supplier shall conduct internal audits.
        identifiers:
          - discipline: Q
            level: 4
    chapters:
      - number: "5.1"
        name: Tools
        requirements:
          - position: a
            text: Autocode generators shall be qualified.
            identifiers:
              - discipline: W
                level: 2
                limitations: [SAT]
            drd_references: [SRR-01]
          - position: a1
            text: Qualification evidence shall be archived.
            identifiers:
              - discipline: W
                level: 1
          - position: b
            text: Acceptance review of tools.
            phases: [D]
            identifiers:
              - discipline: Q
                level: 0
            drd_references: [SRR-01]
drds:
  - number: SPAP
    title: Software product assurance plan
    action: approval
    due_milestones: "SRR; PDR"
  - number: SRR-01
    title: Software requirements specification
    due_milestones: SRR
"#;

const PROJECT: &str = r#"
name: Sat-1
phases: [A]
vector:
  Q: 4
  W: 2
screening_tags: [SAT]
"#;

fn write_inputs(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let catalog_path = dir.path().join("catalog.yaml");
    let project_path = dir.path().join("project.yaml");
    fs::write(&catalog_path, CATALOG).unwrap();
    fs::write(&project_path, PROJECT).unwrap();
    (catalog_path, project_path)
}

fn selected(tailored: &TailoredCatalog, chapter: &str, position: &str) -> bool {
    tailored
        .find_chapter(chapter)
        .and_then(|c| c.requirement(position))
        .map(|r| r.is_selected())
        .unwrap()
}

#[test]
fn test_tailor_from_files() {
    let dir = TempDir::new().unwrap();
    let (catalog_path, project_path) = write_inputs(&dir);

    let catalog = load_catalog(&catalog_path).unwrap();
    let profile = load_profile(&project_path).unwrap();
    let tailored = tailor(&catalog, &profile);

    assert!(selected(&tailored, "5", "a"));
    assert!(selected(&tailored, "5", "b"));
    assert!(selected(&tailored, "5.1", "a"));
    assert!(selected(&tailored, "5.1", "a1"));
    assert!(!selected(&tailored, "5.1", "b"));
}

#[test]
fn test_lower_vector_deselects() {
    let dir = TempDir::new().unwrap();
    let (catalog_path, _) = write_inputs(&dir);
    let catalog = load_catalog(&catalog_path).unwrap();

    let profile =
        ProjectProfile::new([Phase::A], SelectionVector::new([("Q", 3), ("W", 3)]).unwrap())
            .with_tags(["SAT"]);
    let tailored = tailor(&catalog, &profile);

    assert!(!selected(&tailored, "5", "b"));
    // limited identifier does not widen to a higher level
    assert!(!selected(&tailored, "5.1", "a"));
    assert!(selected(&tailored, "5.1", "a1"));
}

#[test]
fn test_drd_list_for_phase_a() {
    let dir = TempDir::new().unwrap();
    let (catalog_path, project_path) = write_inputs(&dir);
    let tailored = tailor(
        &load_catalog(&catalog_path).unwrap(),
        &load_profile(&project_path).unwrap(),
    );

    let list = collect_catalog_drds(&tailored, DrdScope::Selected);
    let srr = &list["SRR-01"];
    assert_eq!(
        srr.requirements.iter().cloned().collect::<Vec<_>>(),
        vec![RequirementRef::new("5.1", "a")]
    );
    assert!(list["SPAP"].requirements.contains(&RequirementRef::new("5", "a")));

    let all = collect_catalog_drds(&tailored, DrdScope::All);
    assert_eq!(all["SRR-01"].requirements.len(), 2);

    let registry = DrdCatalog::new(tailored.drds.clone());
    let later: BTreeSet<Phase> = [Phase::C].into_iter().collect();
    assert!(collect_drds(&tailored.chapters[0], &later, &registry).is_empty());
}

#[test]
fn test_snapshot_edits_persist_and_leave_master_untouched() {
    let dir = TempDir::new().unwrap();
    let (catalog_path, project_path) = write_inputs(&dir);
    let catalog = load_catalog(&catalog_path).unwrap();
    let master_before = catalog.clone();

    let snapshot_path = dir.path().join("snapshot.yaml");
    let storage = Storage::new(&snapshot_path);
    storage
        .save(&tailor(&catalog, &load_profile(&project_path).unwrap()))
        .unwrap();

    let position = storage
        .update_atomically(|snapshot: &mut TailoredCatalog| {
            snapshot.set_selected_for_chapter("5.1", false)?;
            snapshot.update_requirement(
                "5",
                "b",
                RequirementUpdate {
                    text: Some("Audits as agreed with the customer.".into()),
                    selected: None,
                },
            )?;
            Ok(snapshot.insert_requirement("5.1", "a", NewRequirement::new("Tool list"))?)
        })
        .unwrap();
    // "a1" already exists in 5.1
    assert_eq!(position, "a2");

    let snapshot: TailoredCatalog = storage.load().unwrap();
    assert!(!selected(&snapshot, "5.1", "a"));
    assert!(selected(&snapshot, "5.1", "a2"));
    assert_eq!(
        snapshot.find_chapter("5").unwrap().requirement("b").unwrap().text,
        "Audits as agreed with the customer."
    );
    assert_eq!(snapshot.requirement_count(), 6);

    assert_eq!(catalog, master_before);
    assert_eq!(load_catalog(&catalog_path).unwrap(), master_before);
}

#[test]
fn test_concurrent_tailorings_are_independent() {
    let dir = TempDir::new().unwrap();
    let (catalog_path, _) = write_inputs(&dir);
    let catalog = Arc::new(load_catalog(&catalog_path).unwrap());

    let handles: Vec<_> = (0u8..=6)
        .map(|level| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let profile =
                    ProjectProfile::new([Phase::A], SelectionVector::new([("Q", level)]).unwrap());
                let mut tailored = tailor(&catalog, &profile);
                tailored.set_selected_for_chapter("5", level % 2 == 0).unwrap();
                (level, tailored.selected_count())
            })
        })
        .collect();

    for handle in handles {
        let (level, count) = handle.join().unwrap();
        let expected = if level % 2 == 0 { 5 } else { 0 };
        assert_eq!(count, expected);
    }
    assert!(catalog.find_chapter("5").unwrap().requirements[0].selection.is_none());
}
