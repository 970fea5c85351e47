//! Structural search-space pruning.
//!
//! Removes person↔rotation pairs that can never be assigned, before any
//! solver runs. This layer only checks role and qualification rules;
//! blocks are cross-joined onto the surviving pairs afterward, so time
//! conflicts are not its business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rotasolve_core::{Block, Person, Rotation};

/// Why a pair was pruned. Checks run in declaration order and the first
/// failing rule is the one counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    PersonTypeMismatch,
    PgyLevelTooLow,
    SpecialtyMismatch,
}

impl PruneReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PruneReason::PersonTypeMismatch => "person_type_mismatch",
            PruneReason::PgyLevelTooLow => "pgy_level_too_low",
            PruneReason::SpecialtyMismatch => "specialty_mismatch",
        }
    }
}

/// Outcome of one pruning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningResult {
    /// Surviving pairs as (person index, rotation index) into the inputs.
    pub feasible_pairs: Vec<(usize, usize)>,
    pub pruned_count: usize,
    /// Always `|persons| * |rotations|`; blocks play no part here.
    pub total_evaluated: usize,
    /// Fraction of pairs removed, in `[0, 1]`.
    pub reduction_ratio: f64,
    pub pruning_reasons: BTreeMap<PruneReason, usize>,
    /// Carried along so reduction estimates can account for blocks.
    pub block_count: usize,
}

/// Search-space projection after cross-joining blocks onto feasible pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionEstimate {
    /// `feasible_pairs * blocks`.
    pub total_combinations: u64,
    /// `persons * rotations * blocks`, the unpruned space.
    pub unpruned_combinations: u64,
    /// `1 - total/unpruned`; 0.0 when nothing was pruned or inputs are empty.
    pub reduction_factor: f64,
}

/// Returns the reason the pair is structurally infeasible, or `None` if
/// it survives all rules.
fn check_pair(person: &Person, rotation: &Rotation) -> Option<PruneReason> {
    if !rotation.allowed_person_types.contains(&person.person_type) {
        return Some(PruneReason::PersonTypeMismatch);
    }
    if let Some(min_level) = rotation.min_pgy_level {
        // A person with no PGY level cannot demonstrate the minimum.
        if person.pgy_level.map_or(true, |level| level < min_level) {
            return Some(PruneReason::PgyLevelTooLow);
        }
    }
    if !rotation.required_specialties.is_empty()
        && rotation
            .required_specialties
            .is_disjoint(&person.specialties)
    {
        return Some(PruneReason::SpecialtyMismatch);
    }
    None
}

/// Filters structurally infeasible person↔rotation pairs.
///
/// Pure function: no side effects beyond a summary log line, and it never
/// fails. Empty inputs produce an empty result with `reduction_ratio` 0.
///
/// # Example
///
/// ```
/// use rotasolve_core::{Person, PersonType, Rotation};
/// use rotasolve_engine::pruner::prune;
///
/// let persons = vec![Person::new("r1", PersonType::Resident).with_pgy_level(1)];
/// let rotations = vec![Rotation::new("icu")
///     .with_allowed_types([PersonType::Resident])
///     .with_min_pgy_level(2)];
///
/// let result = prune(&persons, &rotations, &[]);
/// assert!(result.feasible_pairs.is_empty());
/// assert_eq!(result.pruned_count, 1);
/// ```
pub fn prune(persons: &[Person], rotations: &[Rotation], blocks: &[Block]) -> PruningResult {
    let total_evaluated = persons.len() * rotations.len();
    let mut feasible_pairs = Vec::new();
    let mut pruning_reasons: BTreeMap<PruneReason, usize> = BTreeMap::new();

    for (p_idx, person) in persons.iter().enumerate() {
        for (r_idx, rotation) in rotations.iter().enumerate() {
            match check_pair(person, rotation) {
                None => feasible_pairs.push((p_idx, r_idx)),
                Some(reason) => {
                    *pruning_reasons.entry(reason).or_insert(0) += 1;
                }
            }
        }
    }

    let pruned_count = total_evaluated - feasible_pairs.len();
    let reduction_ratio = if total_evaluated == 0 {
        0.0
    } else {
        pruned_count as f64 / total_evaluated as f64
    };

    tracing::info!(
        total_evaluated,
        pruned_count,
        feasible = feasible_pairs.len(),
        reduction_ratio,
        "pruned person/rotation pairs"
    );

    PruningResult {
        feasible_pairs,
        pruned_count,
        total_evaluated,
        reduction_ratio,
        pruning_reasons,
        block_count: blocks.len(),
    }
}

/// Projects the pruning result onto the full person×rotation×block space.
pub fn estimate_reduction(result: &PruningResult) -> ReductionEstimate {
    let total_combinations = result.feasible_pairs.len() as u64 * result.block_count as u64;
    let unpruned_combinations = result.total_evaluated as u64 * result.block_count as u64;
    let reduction_factor = if unpruned_combinations == 0 {
        0.0
    } else {
        1.0 - total_combinations as f64 / unpruned_combinations as f64
    };
    ReductionEstimate {
        total_combinations,
        unpruned_combinations,
        reduction_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotasolve_core::PersonType;

    fn resident(id: &str, pgy: u8) -> Person {
        Person::new(id, PersonType::Resident).with_pgy_level(pgy)
    }

    fn resident_rotation(id: &str) -> Rotation {
        Rotation::new(id).with_allowed_types([PersonType::Resident])
    }

    fn blocks(n: usize) -> Vec<Block> {
        (0..n)
            .map(|i| {
                Block::new(
                    format!("b{i}"),
                    chrono::NaiveDate::from_ymd_opt(2026, 7, 1 + i as u32).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn qualified_pair_is_feasible() {
        let persons = vec![resident("r1", 3).with_specialties(["icu"])];
        let rotations = vec![resident_rotation("icu")
            .with_min_pgy_level(2)
            .with_required_specialties(["icu"])];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.feasible_pairs, vec![(0, 0)]);
        assert_eq!(result.pruned_count, 0);
        assert!(result.pruning_reasons.is_empty());
    }

    #[test]
    fn pgy_one_pruned_from_min_pgy_two_rotation() {
        let persons = vec![resident("r1", 1)];
        let rotations = vec![resident_rotation("senior").with_min_pgy_level(2)];
        let result = prune(&persons, &rotations, &[]);
        assert!(result.feasible_pairs.is_empty());
        assert_eq!(result.pruning_reasons[&PruneReason::PgyLevelTooLow], 1);
    }

    #[test]
    fn faculty_pruned_from_resident_only_rotation() {
        let persons = vec![Person::new("f1", PersonType::Faculty)];
        let rotations = vec![resident_rotation("clinic")];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.pruning_reasons[&PruneReason::PersonTypeMismatch], 1);
    }

    #[test]
    fn disjoint_specialties_pruned() {
        let persons = vec![resident("r1", 3).with_specialties(["cardiology"])];
        let rotations =
            vec![resident_rotation("icu").with_required_specialties(["icu", "pulmonology"])];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.pruning_reasons[&PruneReason::SpecialtyMismatch], 1);
    }

    #[test]
    fn first_failing_rule_is_counted() {
        // Fails type, pgy and specialty checks; only the type mismatch counts.
        let persons = vec![Person::new("f1", PersonType::Faculty)];
        let rotations = vec![resident_rotation("icu")
            .with_min_pgy_level(2)
            .with_required_specialties(["icu"])];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.pruning_reasons.len(), 1);
        assert_eq!(result.pruning_reasons[&PruneReason::PersonTypeMismatch], 1);
    }

    #[test]
    fn missing_pgy_level_fails_a_minimum() {
        let persons = vec![Person::new("r1", PersonType::Resident)];
        let rotations = vec![resident_rotation("senior").with_min_pgy_level(2)];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.pruning_reasons[&PruneReason::PgyLevelTooLow], 1);
    }

    #[test]
    fn unset_optional_fields_are_unrestricted() {
        let persons = vec![Person::new("r1", PersonType::Resident)];
        let rotations = vec![resident_rotation("clinic")];
        let result = prune(&persons, &rotations, &[]);
        assert_eq!(result.feasible_pairs.len(), 1);
    }

    #[test]
    fn total_evaluated_is_block_agnostic() {
        let persons = vec![resident("r1", 2), resident("r2", 3)];
        let rotations = vec![resident_rotation("a"), resident_rotation("b")];
        let result = prune(&persons, &rotations, &blocks(10));
        assert_eq!(result.total_evaluated, 4);
        assert_eq!(result.block_count, 10);
    }

    #[test]
    fn estimate_crosses_blocks_onto_feasible_pairs() {
        let persons = vec![resident("r1", 1), resident("r2", 3)];
        let rotations = vec![resident_rotation("senior").with_min_pgy_level(2)];
        let result = prune(&persons, &rotations, &blocks(4));
        // One of two pairs survives.
        let estimate = estimate_reduction(&result);
        assert_eq!(estimate.total_combinations, 4);
        assert_eq!(estimate.unpruned_combinations, 8);
        assert!((estimate.reduction_factor - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_do_not_divide_by_zero() {
        let result = prune(&[], &[], &[]);
        assert_eq!(result.total_evaluated, 0);
        assert_eq!(result.reduction_ratio, 0.0);
        let estimate = estimate_reduction(&result);
        assert_eq!(estimate.reduction_factor, 0.0);
    }
}
