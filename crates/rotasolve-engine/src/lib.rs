//! Rotasolve engine - adaptive multi-strategy schedule optimization
//!
//! The optimization core: search-space pruning, content-addressed
//! solution memoization, concurrent strategy racing with cancellation,
//! and a closed-loop parameter adapter, driven per session by the
//! [`controller::IterationController`].
//!
//! The pruner and adapter are pure and need no synchronization; the
//! cache is a concurrent store safe to share across sessions; the
//! parallel solver is the only component that spawns threads.

pub mod adapter;
pub mod cache;
pub mod controller;
pub mod parallel;
pub mod pruner;

pub use adapter::{Action, AdaptationRule, ParameterAdapter, RuleCondition};
pub use cache::{problem_fingerprint, SolutionCache};
pub use controller::{
    IterationController, OptimizationOutcome, ProblemInstance, ScheduleProblem, SolveRequest,
};
pub use parallel::{CancelToken, ParallelSolver, Strategy, TaskContext};
pub use pruner::{estimate_reduction, prune, PruneReason, PruningResult, ReductionEstimate};
