use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::drd::DrdList;
use crate::models::Chapter;
use crate::tailoring::TailoredCatalog;

/// Selection figures of one chapter, sub-chapters included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub number: String,
    pub name: String,
    /// Nesting depth, 0 for top-level chapters
    pub depth: usize,
    pub selected: usize,
    pub total: usize,
}

fn summarize(chapter: &Chapter, depth: usize, out: &mut Vec<ChapterSummary>) {
    out.push(ChapterSummary {
        number: chapter.number.clone(),
        name: chapter.name.clone(),
        depth,
        selected: chapter.selected_count(),
        total: chapter.requirement_count(),
    });
    for child in &chapter.chapters {
        summarize(child, depth + 1, out);
    }
}

/// Per-chapter selection summary in document order
pub fn selection_report(tailored: &TailoredCatalog) -> Vec<ChapterSummary> {
    let mut out = Vec::new();
    for chapter in &tailored.chapters {
        summarize(chapter, 0, &mut out);
    }
    out
}

/// Export a tailored catalog to JSON format
pub fn export_json(tailored: &TailoredCatalog, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(tailored)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    info!(
        "Exported to JSON: {} ({} requirements)",
        output_path.display(),
        tailored.requirement_count()
    );
    Ok(())
}

/// Export a tailored catalog to YAML format
pub fn export_yaml(tailored: &TailoredCatalog, output_path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(tailored)?;
    fs::write(output_path, yaml)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    info!(
        "Exported to YAML: {} ({} requirements)",
        output_path.display(),
        tailored.requirement_count()
    );
    Ok(())
}

/// Export the DRD list as a JSON array ordered by DRD number
pub fn export_drd_list_json(list: &DrdList, output_path: &Path) -> Result<()> {
    let entries: Vec<_> = list.values().collect();
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    info!("Exported {} DRD(s) to {}", list.len(), output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drd::{collect_catalog_drds, DrdScope};
    use crate::models::{Catalog, Drd, Identifier, Phase, ProjectProfile, Requirement};
    use crate::tailoring::tailor;
    use crate::vector::SelectionVector;
    use tempfile::TempDir;

    fn tailored() -> TailoredCatalog {
        let mut catalog = Catalog::new("ECSS-M-ST-10", "C");
        let mut ch = Chapter::new("5", "Project planning");
        ch.add_requirement(
            Requirement::new("a", "Produce a project management plan")
                .with_identifier(Identifier::new("M", 1))
                .with_drd("PMP"),
        )
        .unwrap();
        let mut sub = Chapter::new("5.1", "Breakdown structures");
        sub.add_requirement(
            Requirement::new("a", "Produce a WBS").with_identifier(Identifier::new("M", 3)),
        )
        .unwrap();
        ch.add_chapter(sub).unwrap();
        catalog.add_chapter(ch).unwrap();
        catalog.drds.push(Drd::new("PMP", "Project management plan", "PRR; SRR"));

        let profile = ProjectProfile::new([Phase::A], SelectionVector::new([("M", 2)]).unwrap());
        tailor(&catalog, &profile)
    }

    #[test]
    fn test_selection_report() {
        let report = selection_report(&tailored());
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].number, "5");
        assert_eq!((report[0].selected, report[0].total), (1, 2));
        assert_eq!(report[1].depth, 1);
        assert_eq!((report[1].selected, report[1].total), (0, 1));
    }

    #[test]
    fn test_export_json_and_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = tailored();

        let json_path = temp_dir.path().join("out.json");
        export_json(&snapshot, &json_path).unwrap();
        let from_json: TailoredCatalog =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(from_json.chapters, snapshot.chapters);

        let yaml_path = temp_dir.path().join("out.yaml");
        export_yaml(&snapshot, &yaml_path).unwrap();
        let content = fs::read_to_string(&yaml_path).unwrap();
        assert!(content.contains("catalog_name: ECSS-M-ST-10"));
    }

    #[test]
    fn test_export_drd_list() {
        let temp_dir = TempDir::new().unwrap();
        let list = collect_catalog_drds(&tailored(), DrdScope::Selected);
        let path = temp_dir.path().join("drds.json");
        export_drd_list_json(&list, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["drd"]["number"], "PMP");
        assert_eq!(value[0]["requirements"][0]["chapter"], "5");
        assert_eq!(value[0]["requirements"][0]["position"], "a");
    }
}
