mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use tailor_core::export::{export_drd_list_json, export_json, export_yaml};
use tailor_core::{
    collect_catalog_drds, due_phases, get_config_path, load_catalog, load_profile,
    load_snapshot, selection_report, tailor, DrdScope, NewRequirement, OutputFormat,
    RequirementUpdate, Storage, TailorConfig, TailoredCatalog,
};

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let config = TailorConfig::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    log::debug!("Using configuration from {:?}", config_path);

    match &cli.command {
        Command::Validate { catalog } => {
            validate_catalog(catalog)?;
        }
        Command::Run {
            catalog,
            project,
            output,
            format,
        } => {
            run_tailoring(catalog, project, output, format.as_deref())?;
        }
        Command::Retailor {
            snapshot,
            catalog,
            project,
        } => {
            retailor_snapshot(snapshot, catalog, project)?;
        }
        Command::Drds {
            snapshot,
            all,
            output,
        } => {
            let scope = if *all { DrdScope::All } else { config.drd_scope };
            list_drds(snapshot, scope, output.as_deref())?;
        }
        Command::Select {
            snapshot,
            chapter,
            value,
        } => {
            select_chapter(snapshot, chapter, *value)?;
        }
        Command::Update {
            snapshot,
            chapter,
            position,
            text,
            selected,
        } => {
            let update = RequirementUpdate {
                text: text.clone(),
                selected: *selected,
            };
            update_requirement(snapshot, chapter, position, update)?;
        }
        Command::Insert {
            snapshot,
            chapter,
            after,
            text,
            drds,
        } => {
            let mut new = NewRequirement::new(text.clone());
            new.drd_references = drds.iter().cloned().collect();
            insert_requirement(snapshot, chapter, after, new)?;
        }
        Command::Report { snapshot } => {
            show_report(snapshot)?;
        }
        Command::Export {
            snapshot,
            output,
            format,
        } => {
            let format = match format {
                Some(f) => f.parse()?,
                None => config.output_format,
            };
            export_snapshot(snapshot, output, format)?;
        }
    }

    Ok(())
}

fn validate_catalog(path: &Path) -> Result<()> {
    let catalog = load_catalog(path)?;

    println!("{}", "Catalog is valid".green());
    println!("Name: {} {}", catalog.name, catalog.version);
    println!("Top-level chapters: {}", catalog.chapters.len());
    println!("Requirements: {}", catalog.requirement_count());
    println!("DRDs: {}", catalog.drds.len());
    Ok(())
}

/// Snapshots are always read back by extension, so `--format` only confirms
/// it; the configured export format does not apply here.
fn write_snapshot(snapshot: &TailoredCatalog, output: &Path, format: Option<&str>) -> Result<()> {
    let storage = match format {
        Some(f) => Storage::with_format(output, f.parse::<OutputFormat>()?)?,
        None => Storage::new(output),
    };
    storage.save(snapshot)
}

fn run_tailoring(
    catalog: &Path,
    project: &Path,
    output: &Path,
    format: Option<&str>,
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let profile = load_profile(project)
        .with_context(|| format!("Failed to load project profile {:?}", project))?;

    let tailored = tailor(&catalog, &profile);
    write_snapshot(&tailored, output, format)?;

    println!("{}", "Tailoring complete".green());
    println!("Snapshot: {} ({})", output.display(), tailored.id);
    println!("Vector: {}", profile.vector);
    println!(
        "Selected: {} of {} requirements",
        tailored.selected_count().to_string().green(),
        tailored.requirement_count()
    );
    Ok(())
}

fn retailor_snapshot(snapshot_path: &Path, catalog: &Path, project: &Path) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let profile = load_profile(project)?;
    let storage = Storage::new(snapshot_path);

    let (changes, fresh) = storage.update_atomically(|snapshot: &mut TailoredCatalog| {
        let changes = snapshot.profile.vector.compare(&profile.vector);
        let dropped = snapshot.overridden_count();
        *snapshot = snapshot.retailor(&catalog, &profile);
        Ok((changes, (dropped, snapshot.selected_count(), snapshot.requirement_count())))
    })?;

    if changes.is_empty() {
        println!("Selection vector unchanged");
    } else {
        println!("{}", "Selection vector changes:".bold());
        for change in &changes {
            println!("  {}", change);
        }
    }
    let (dropped, selected, total) = fresh;
    if dropped > 0 {
        println!(
            "{}",
            format!("Discarded {} manual override(s)", dropped).yellow()
        );
    }
    println!("Selected: {} of {} requirements", selected, total);
    Ok(())
}

fn list_drds(snapshot: &Path, scope: DrdScope, output: Option<&Path>) -> Result<()> {
    let tailored = load_snapshot(snapshot)?;
    let list = collect_catalog_drds(&tailored, scope);

    if list.is_empty() {
        println!("No DRDs due.");
    }
    for entry in list.values() {
        let refs: Vec<String> = entry.requirements.iter().map(|r| r.to_string()).collect();
        println!("{} {}", entry.drd.number.cyan(), entry.drd.title);
        if !entry.drd.action.is_empty() {
            println!("  Action: {}", entry.drd.action);
        }
        let phases: Vec<String> = due_phases(&entry.drd.due_milestones)
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "  Due: {} (phases {})",
            entry.drd.due_milestones,
            phases.join(", ")
        );
        println!("  Requirements: {}", refs.join(", "));
    }

    if let Some(path) = output {
        export_drd_list_json(&list, path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn select_chapter(snapshot: &Path, chapter: &str, value: bool) -> Result<()> {
    let touched = Storage::new(snapshot).update_atomically(|tailored: &mut TailoredCatalog| {
        Ok(tailored.set_selected_for_chapter(chapter, value)?)
    })?;

    let state = if value { "selected".green() } else { "deselected".red() };
    println!("{} requirement(s) under chapter {} {}", touched, chapter, state);
    Ok(())
}

fn update_requirement(
    snapshot: &Path,
    chapter: &str,
    position: &str,
    update: RequirementUpdate,
) -> Result<()> {
    if update.text.is_none() && update.selected.is_none() {
        anyhow::bail!("Nothing to update. Use --text and/or --selected.");
    }

    let selected = Storage::new(snapshot).update_atomically(|tailored: &mut TailoredCatalog| {
        let requirement = tailored.update_requirement(chapter, position, update)?;
        Ok(requirement.is_selected())
    })?;

    println!("{}", "Requirement updated".green());
    println!("{}{} selected: {}", chapter, position, selected);
    Ok(())
}

fn insert_requirement(
    snapshot: &Path,
    chapter: &str,
    after: &str,
    new: NewRequirement,
) -> Result<()> {
    let position = Storage::new(snapshot).update_atomically(|tailored: &mut TailoredCatalog| {
        Ok(tailored.insert_requirement(chapter, after, new)?)
    })?;

    println!("{}", "Requirement inserted".green());
    println!("Position: {}{}", chapter, position.green());
    Ok(())
}

fn show_report(snapshot: &Path) -> Result<()> {
    let tailored = load_snapshot(snapshot)?;

    println!(
        "{} {} for {}",
        tailored.catalog_name.bold(),
        tailored.catalog_version,
        tailored.profile.name
    );
    let phases: Vec<String> = tailored.profile.phases.iter().map(|p| p.to_string()).collect();
    println!("Phases: {}", phases.join(", "));
    println!("Vector: {}", tailored.profile.vector);
    println!("Tailored at: {}", tailored.tailored_at.to_rfc3339());
    println!();

    for summary in selection_report(&tailored) {
        let indent = "  ".repeat(summary.depth);
        let figures = format!("{}/{}", summary.selected, summary.total);
        let figures = if summary.selected == 0 {
            figures.dimmed()
        } else {
            figures.normal()
        };
        println!("{}{} {} [{}]", indent, summary.number, summary.name, figures);
    }

    println!();
    println!(
        "Total: {} of {} selected, {} manual override(s)",
        tailored.selected_count(),
        tailored.requirement_count(),
        tailored.overridden_count()
    );
    Ok(())
}

fn export_snapshot(snapshot: &Path, output: &Path, format: OutputFormat) -> Result<()> {
    let tailored = load_snapshot(snapshot)?;
    match format {
        OutputFormat::Json => export_json(&tailored, output)?,
        OutputFormat::Yaml => export_yaml(&tailored, output)?,
    }
    println!("Exported to {}: {}", format, output.display());
    Ok(())
}
