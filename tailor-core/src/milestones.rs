//! DRD Phase-Applicability Predicate
//!
//! Maps project phases to the review milestones that fall inside them and
//! decides whether a DRD with a given due-milestone list is due for a set of
//! project phases.
//!
//! A due token that appears nowhere in the milestone table is treated as due
//! in every phase. Free-form milestones therefore always make a DRD due, and
//! so does a misspelled one.

use std::collections::BTreeSet;

use crate::models::Phase;

/// Milestones that fall inside a phase (case-sensitive)
pub fn milestones_for(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Zero => &["MDR"],
        Phase::A => &["PRR", "SRR"],
        Phase::B => &["PDR"],
        Phase::C => &["CDR"],
        Phase::D => &[
            "MRR", "TRR", "QR", "CCB", "MPCB", "AR", "DRB", "DAR", "FRR", "LRR",
        ],
        Phase::E => &["AR", "ORR", "GS upgrades", "SW upgrades", "CRR", "ELR"],
        Phase::F => &["EOM", "MCR"],
    }
}

/// True if any phase lists the milestone
pub fn is_known_milestone(token: &str) -> bool {
    Phase::all()
        .iter()
        .any(|phase| milestones_for(*phase).contains(&token))
}

/// Splits a `;`-delimited milestone list into trimmed, non-empty tokens
pub fn tokenize(due_milestones: &str) -> Vec<&str> {
    due_milestones
        .split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Whether any of the tokens makes the DRD due in `phase`
fn due_in_phase(tokens: &[&str], phase: Phase) -> bool {
    let milestones = milestones_for(phase);
    tokens
        .iter()
        .any(|token| milestones.contains(token) || !is_known_milestone(token))
}

/// Decides whether a DRD is due for at least one of the project phases.
///
/// An empty or blank milestone list yields no tokens and is never due.
pub fn is_drd_due(due_milestones: &str, project_phases: &BTreeSet<Phase>) -> bool {
    let tokens = tokenize(due_milestones);
    project_phases
        .iter()
        .any(|phase| due_in_phase(&tokens, *phase))
}

/// All phases in which the milestone list makes a DRD due
pub fn due_phases(due_milestones: &str) -> BTreeSet<Phase> {
    let tokens = tokenize(due_milestones);
    Phase::all()
        .iter()
        .copied()
        .filter(|phase| due_in_phase(&tokens, *phase))
        .collect()
}
