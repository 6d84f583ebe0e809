//! Applicability Predicate
//!
//! Decides whether one requirement is selected for a project from its
//! identifiers and phases, the project's selection vector, its active phases
//! and the tags found on its screening sheet.
//!
//! The two identifier branches are deliberately asymmetric:
//! - an unconditional identifier at level N applies from stringency N upward;
//! - a limited identifier applies only at exactly its level, and only when
//!   every limitation tag was found during screening.

use std::collections::BTreeSet;

use crate::models::{Identifier, Phase, ProjectProfile, Requirement};
use crate::vector::SelectionVector;

/// Phase gate: a requirement restricted to phases applies only if one of
/// them is active for the project
pub fn phase_applies(
    requirement_phases: &BTreeSet<Phase>,
    project_phases: &BTreeSet<Phase>,
) -> bool {
    requirement_phases.is_empty() || !requirement_phases.is_disjoint(project_phases)
}

/// Whether a single identifier matches the vector and screening tags
pub fn identifier_matches(
    identifier: &Identifier,
    vector: &SelectionVector,
    screening_tags: &BTreeSet<String>,
) -> bool {
    if identifier.limitations.is_empty() {
        vector.meets(&identifier.discipline, identifier.level)
    } else {
        identifier.limitations.is_subset(screening_tags)
            && vector.matches_exactly(&identifier.discipline, identifier.level)
    }
}

/// Decides whether a requirement is selected.
///
/// The phase gate dominates: a requirement whose phases miss every project
/// phase is never selected, whatever its identifiers say. Otherwise the
/// first matching identifier selects it.
pub fn is_selected(
    identifiers: &[Identifier],
    requirement_phases: &BTreeSet<Phase>,
    project_phases: &BTreeSet<Phase>,
    vector: &SelectionVector,
    screening_tags: &BTreeSet<String>,
) -> bool {
    if !phase_applies(requirement_phases, project_phases) {
        return false;
    }
    identifiers
        .iter()
        .any(|identifier| identifier_matches(identifier, vector, screening_tags))
}

/// [`is_selected`] with the inputs taken from a requirement and a project profile
pub fn requirement_selected(requirement: &Requirement, profile: &ProjectProfile) -> bool {
    is_selected(
        &requirement.identifiers,
        &requirement.phases,
        &profile.phases,
        &profile.vector,
        &profile.screening_tags,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn phases(list: &[Phase]) -> BTreeSet<Phase> {
        list.iter().copied().collect()
    }

    fn tags(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn vector(discipline: &str, level: u8) -> SelectionVector {
        SelectionVector::new([(discipline, level)]).unwrap()
    }

    #[test]
    fn test_unconditional_identifier_at_vector_level() {
        let ids = [Identifier::new("Q", 4)];
        let no_phases = BTreeSet::new();
        let project = phases(&[Phase::A]);

        assert!(is_selected(&ids, &no_phases, &project, &vector("Q", 4), &tags(&[])));
        assert!(!is_selected(&ids, &no_phases, &project, &vector("Q", 3), &tags(&[])));
    }

    #[test]
    fn test_limited_identifier_requires_exact_level() {
        let ids = [Identifier::limited("W", 2, ["SAT"])];
        let no_phases = BTreeSet::new();
        let project = phases(&[Phase::B]);
        let screening = tags(&["SAT"]);

        assert!(is_selected(&ids, &no_phases, &project, &vector("W", 2), &screening));
        assert!(!is_selected(&ids, &no_phases, &project, &vector("W", 3), &screening));
    }

    #[test]
    fn test_limited_identifier_requires_all_tags() {
        let ids = [Identifier::limited("W", 2, ["SAT", "LAUNCHER"])];
        let no_phases = BTreeSet::new();
        let project = phases(&[Phase::B]);

        assert!(!is_selected(&ids, &no_phases, &project, &vector("W", 2), &tags(&["SAT"])));
        assert!(is_selected(
            &ids,
            &no_phases,
            &project,
            &vector("W", 2),
            &tags(&["SAT", "LAUNCHER", "OTHER"])
        ));
    }

    #[test]
    fn test_level_zero_always_applies() {
        let ids = [Identifier::new("M", 0)];
        let empty = SelectionVector::default();
        assert!(is_selected(&ids, &BTreeSet::new(), &phases(&[Phase::C]), &empty, &tags(&[])));
    }

    #[test]
    fn test_phase_gate_dominates_matching_identifier() {
        let ids = [Identifier::new("M", 0)];
        let req_phases = phases(&[Phase::D, Phase::E]);
        let empty = SelectionVector::default();

        let early = phases(&[Phase::A, Phase::B]);
        let late = phases(&[Phase::B, Phase::D]);
        assert!(!is_selected(&ids, &req_phases, &early, &empty, &tags(&[])));
        assert!(is_selected(&ids, &req_phases, &late, &empty, &tags(&[])));
    }

    #[test]
    fn test_any_identifier_selects() {
        let ids = [Identifier::new("Q", 5), Identifier::new("S", 1)];
        let vector = SelectionVector::new([("Q", 2), ("S", 1)]).unwrap();
        assert!(is_selected(&ids, &BTreeSet::new(), &phases(&[Phase::A]), &vector, &tags(&[])));
    }

    #[test]
    fn test_no_identifiers_never_selected() {
        let vector = vector("Q", 6);
        assert!(!is_selected(&[], &BTreeSet::new(), &phases(&[Phase::A]), &vector, &tags(&[])));
    }

    #[test]
    fn test_requirement_selected_uses_profile() {
        let req = Requirement::new("a", "Text")
            .with_identifier(Identifier::new("Q", 2))
            .with_phases([Phase::B]);
        let profile = ProjectProfile::new([Phase::B], vector("Q", 3));
        assert!(requirement_selected(&req, &profile));

        let later = ProjectProfile::new([Phase::C], vector("Q", 3));
        assert!(!requirement_selected(&req, &later));
    }

    fn phase_strategy() -> impl Strategy<Value = Phase> {
        prop::sample::select(Phase::all().to_vec())
    }

    proptest! {
        #[test]
        fn prop_phase_gate_dominates(
            req_phases in prop::collection::btree_set(phase_strategy(), 1..4),
            project_phases in prop::collection::btree_set(phase_strategy(), 0..4),
            level in 0u8..=6,
            required in 0u8..=6,
        ) {
            prop_assume!(req_phases.is_disjoint(&project_phases));
            let ids = [Identifier::new("Q", required), Identifier::limited("Q", required, ["T"])];
            let vector = vector("Q", level);
            let selected = is_selected(&ids, &req_phases, &project_phases, &vector, &tags(&["T"]));
            prop_assert!(!selected);
        }

        #[test]
        fn prop_unconditional_is_monotonic(level in 0u8..=6, required in 0u8..=6) {
            let ids = [Identifier::new("E", required)];
            let active = phases(&[Phase::A]);
            let vector = vector("E", level);
            let selected = is_selected(&ids, &BTreeSet::new(), &active, &vector, &tags(&[]));
            prop_assert_eq!(selected, level >= required);
        }

        #[test]
        fn prop_limited_is_exact(level in 0u8..=6, required in 0u8..=6, tagged in any::<bool>()) {
            let ids = [Identifier::limited("S", required, ["SAT"])];
            let screening = if tagged { tags(&["SAT"]) } else { tags(&[]) };
            let active = phases(&[Phase::A]);
            let vector = vector("S", level);
            let selected = is_selected(&ids, &BTreeSet::new(), &active, &vector, &screening);
            prop_assert_eq!(selected, tagged && level == required);
        }
    }
}
