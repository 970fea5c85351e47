//! Evaluation results produced by the external schedule evaluator.

use serde::{Deserialize, Serialize};

/// How badly a violation hurts the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One concrete constraint violation in an evaluated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationDetail {
    /// Evaluator-defined violation type, e.g. `80_HOUR_VIOLATION`.
    pub violation_type: String,
    pub severity: Severity,
    pub message: String,
}

impl ViolationDetail {
    pub fn new(
        violation_type: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type: violation_type.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Verdict of the external evaluator on one candidate schedule.
///
/// `score` is normalized to `[0, 1]`, higher is better. `valid` means all
/// hard constraints pass; a high score with `valid == false` is the
/// near-feasible regime the adapter narrows search for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub valid: bool,
    pub score: f64,
    pub hard_constraint_pass: bool,
    pub soft_score: f64,
    pub coverage_rate: f64,
    pub total_violations: usize,
    pub critical_violations: usize,
    #[serde(default)]
    pub violations: Vec<ViolationDetail>,
}

impl EvaluationResult {
    /// A failed attempt with no schedule to score. Used when every solver
    /// task in an iteration failed, so the attempt still lands in history.
    pub fn failed_attempt() -> Self {
        Self {
            valid: false,
            score: 0.0,
            hard_constraint_pass: false,
            soft_score: 0.0,
            coverage_rate: 0.0,
            total_violations: 0,
            critical_violations: 0,
            violations: Vec::new(),
        }
    }

    /// True if any violation carries the given type.
    pub fn has_violation_type(&self, violation_type: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.violation_type == violation_type)
    }

    /// True if any violation is CRITICAL severity.
    pub fn has_critical(&self) -> bool {
        self.critical_violations > 0
            || self.violations.iter().any(|v| v.severity == Severity::Critical)
    }
}

/// External collaborator that scores candidate schedules.
///
/// The engine treats this as a black box; it only reads the returned
/// [`EvaluationResult`].
pub trait ScheduleEvaluator<S>: Send + Sync {
    fn evaluate(&self, schedule: &S) -> EvaluationResult;
}

impl<S, F> ScheduleEvaluator<S> for F
where
    F: Fn(&S) -> EvaluationResult + Send + Sync,
{
    fn evaluate(&self, schedule: &S) -> EvaluationResult {
        self(schedule)
    }
}
