//! Error types for Rotasolve

use thiserror::Error;

/// Main error type for Rotasolve operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Error in engine or adapter configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A custom adaptation rule was rejected at registration
    #[error("Rule registration error: {0}")]
    RuleRegistration(String),

    /// Every concurrent solver task failed or missed the deadline
    #[error("All solvers failed")]
    AllSolversFailed,

    /// A single solver task failed; isolated unless universal
    #[error("Solver task {0} failed: {1}")]
    SolverTask(usize, String),

    /// Solving was cancelled before completion
    #[error("Solving was cancelled")]
    Cancelled,

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Rotasolve operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
