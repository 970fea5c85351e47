//! Rotasolve core - shared domain model and types
//!
//! Problem facts (people, rotations, blocks), solver parameters,
//! evaluation results, and the append-only iteration history shared by
//! the engine crates. No solving logic lives here.

pub mod domain;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod params;
pub mod solve;

pub use domain::{Block, DateRange, Person, PersonType, Rotation};
pub use error::{Result, SchedulerError};
pub use evaluation::{EvaluationResult, ScheduleEvaluator, Severity, ViolationDetail};
pub use history::{History, IterationRecord};
pub use params::{Algorithm, GeneratorParams, ParamsOverlay};
pub use solve::{SolverOutcome, SolverResult};
