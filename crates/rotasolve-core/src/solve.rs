//! Solver task and race result types.

use serde::{Deserialize, Serialize};

/// What a single solver task produces on success.
///
/// `objective_value` is the solver's cost, lower is better; `None` when
/// the strategy cannot cost its solution (it then loses every tie).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome<S> {
    pub objective_value: Option<f64>,
    pub solution: S,
}

impl<S> SolverOutcome<S> {
    pub fn new(objective_value: f64, solution: S) -> Self {
        Self {
            objective_value: Some(objective_value),
            solution,
        }
    }
}

/// Aggregated result of a parallel strategy race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverResult<S> {
    pub success: bool,
    pub objective_value: Option<f64>,
    pub solution: Option<S>,
    /// Index of the winning task; tie-breaks go to the lowest index.
    pub solver_id: Option<usize>,
    /// Label of the winning strategy, when the race ran explicit strategies.
    pub strategy: Option<String>,
    pub error: Option<String>,
}

impl<S> SolverResult<S> {
    pub fn won(
        solver_id: usize,
        strategy: Option<String>,
        objective_value: Option<f64>,
        solution: S,
    ) -> Self {
        Self {
            success: true,
            objective_value,
            solution: Some(solution),
            solver_id: Some(solver_id),
            strategy,
            error: None,
        }
    }

    pub fn all_failed() -> Self {
        Self {
            success: false,
            objective_value: None,
            solution: None,
            solver_id: None,
            strategy: None,
            error: Some("All solvers failed".to_string()),
        }
    }
}
