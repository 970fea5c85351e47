//! Built-in adaptation rules and their predicates.

use std::sync::Arc;

use rotasolve_config::AdapterSettings;
use rotasolve_core::{EvaluationResult, History};

use super::{Action, AdaptationRule};

/// Violation type that always forces an algorithm switch.
pub const EIGHTY_HOUR_VIOLATION: &str = "80_HOUR_VIOLATION";
/// Violation type that boosts the resilience constraint weight.
pub const N1_VULNERABILITY: &str = "N1_VULNERABILITY";
/// Constraint weight raised by the resilience rule.
pub const RESILIENCE_WEIGHT: &str = "resilience";

pub(super) fn builtin_rules(settings: &AdapterSettings) -> Vec<AdaptationRule> {
    let near_threshold = settings.near_feasible_threshold;
    let pressure_ratio = settings.timeout_pressure_ratio;
    let window = settings.stagnation_window;
    let epsilon = settings.stagnation_epsilon;

    vec![
        AdaptationRule::builtin(
            "critical_violation_switch",
            100,
            Arc::new(|result, _| {
                result.has_violation_type(EIGHTY_HOUR_VIOLATION) || result.has_critical()
            }),
            Action::SwitchAlgorithm,
        ),
        AdaptationRule::builtin(
            "resilience_weight_boost",
            90,
            Arc::new(|result, _| result.has_violation_type(N1_VULNERABILITY)),
            Action::IncreaseConstraintWeight {
                name: RESILIENCE_WEIGHT.to_string(),
                factor: settings.weight_step,
            },
        ),
        AdaptationRule::builtin(
            "timeout_pressure",
            80,
            Arc::new(move |result, history| {
                timed_out(history, pressure_ratio) && result.score < near_threshold
            }),
            Action::IncreaseTimeout {
                factor: settings.timeout_factor,
            },
        ),
        AdaptationRule::builtin(
            "stagnation_diversify",
            70,
            Arc::new(move |_, history| stagnating(history, window, epsilon)),
            Action::IncreaseDiversification {
                factor: settings.diversification_step,
            },
        ),
        AdaptationRule::builtin(
            "near_feasible_narrow",
            60,
            Arc::new(move |result, _| near_feasible(result, near_threshold)),
            Action::NarrowSearch {
                factor: settings.narrow_factor,
            },
        ),
    ]
}

/// The last attempt consumed nearly its whole timeout.
pub(super) fn timed_out(history: &History, pressure_ratio: f64) -> bool {
    history.last().is_some_and(|last| {
        last.params.timeout_seconds > 0.0
            && last.duration_seconds >= pressure_ratio * last.params.timeout_seconds
    })
}

/// Trailing window of at least `window` scores clustered within `epsilon`.
///
/// Short histories never stagnate; a monotone improvement across the
/// window spreads the scores past `epsilon` and so never counts.
pub(super) fn stagnating(history: &History, window: usize, epsilon: f64) -> bool {
    if history.len() < window {
        return false;
    }
    let scores: Vec<f64> = history.recent(window).iter().map(|r| r.score).collect();
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min <= epsilon
}

/// High score, still violating hard constraints.
pub(super) fn near_feasible(result: &EvaluationResult, threshold: f64) -> bool {
    !result.valid && result.score >= threshold
}
