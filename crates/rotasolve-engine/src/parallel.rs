//! Parallel strategy racing.
//!
//! Fans N solver tasks out onto worker threads over shared read-only
//! problem data, waits out a common wall-clock deadline, and picks the
//! finisher with the lowest objective value. Stragglers get a cooperative
//! cancellation signal once the decision is made and are detached; a slow
//! or failing task can never block or fail the race for the others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};

use rotasolve_config::SolverSettings;
use rotasolve_core::{GeneratorParams, ParamsOverlay, SchedulerError, SolverOutcome, SolverResult};

/// One entrant in a strategy race: a label plus a parameter overlay
/// merged over the shared base params.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub label: String,
    pub overlay: ParamsOverlay,
}

impl Strategy {
    pub fn new(label: impl Into<String>, overlay: ParamsOverlay) -> Self {
        Self {
            label: label.into(),
            overlay,
        }
    }
}

/// Cooperative cancellation flag shared between the aggregator and all
/// tasks of one race.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-task context handed to the solver function.
///
/// Long-running solver functions should poll [`TaskContext::is_cancelled`]
/// and bail out once the race has been decided.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Task index; doubles as strategy index in an explicit-strategy race.
    pub solver_id: usize,
    /// Strategy label, when the race ran explicit strategies.
    pub strategy: Option<String>,
    cancel: CancelToken,
}

impl TaskContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// The function each task runs. It receives the shared problem, the
/// task's merged parameters, and its context.
pub type SolverFn<P, S> = dyn Fn(&P, &GeneratorParams, &TaskContext) -> Result<SolverOutcome<S>, SchedulerError>
    + Send
    + Sync;

/// Races N solver invocations under a shared deadline.
#[derive(Debug, Clone)]
pub struct ParallelSolver {
    num_solvers: usize,
    timeout: Duration,
}

impl ParallelSolver {
    pub fn new(num_solvers: usize, timeout: Duration) -> Self {
        Self {
            num_solvers,
            timeout,
        }
    }

    pub fn from_settings(settings: &SolverSettings) -> Self {
        Self::new(settings.num_solvers, settings.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the shared deadline for subsequent races. The controller uses
    /// this to pick up adapted timeouts between iterations.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Races `num_solvers` identical invocations of `solver_fn`,
    /// distinguished only by their task index.
    pub fn solve<P, S, F>(
        &self,
        problem: Arc<P>,
        params: &GeneratorParams,
        solver_fn: F,
    ) -> SolverResult<S>
    where
        P: Send + Sync + 'static,
        S: Send + 'static,
        F: Fn(&P, &GeneratorParams, &TaskContext) -> Result<SolverOutcome<S>, SchedulerError>
            + Send
            + Sync
            + 'static,
    {
        let tasks = (0..self.num_solvers)
            .map(|id| (id, params.clone(), None))
            .collect();
        self.race(problem, tasks, solver_fn)
    }

    /// Races one task per strategy, ignoring `num_solvers`. Each task runs
    /// with the strategy overlay merged over the base params.
    pub fn solve_strategies<P, S, F>(
        &self,
        problem: Arc<P>,
        params: &GeneratorParams,
        strategies: &[Strategy],
        solver_fn: F,
    ) -> SolverResult<S>
    where
        P: Send + Sync + 'static,
        S: Send + 'static,
        F: Fn(&P, &GeneratorParams, &TaskContext) -> Result<SolverOutcome<S>, SchedulerError>
            + Send
            + Sync
            + 'static,
    {
        let tasks = strategies
            .iter()
            .enumerate()
            .map(|(id, s)| (id, s.overlay.merge_over(params), Some(s.label.clone())))
            .collect();
        self.race(problem, tasks, solver_fn)
    }

    fn race<P, S, F>(
        &self,
        problem: Arc<P>,
        tasks: Vec<(usize, GeneratorParams, Option<String>)>,
        solver_fn: F,
    ) -> SolverResult<S>
    where
        P: Send + Sync + 'static,
        S: Send + 'static,
        F: Fn(&P, &GeneratorParams, &TaskContext) -> Result<SolverOutcome<S>, SchedulerError>
            + Send
            + Sync
            + 'static,
    {
        if tasks.is_empty() {
            tracing::warn!("race started with zero tasks");
            return SolverResult::all_failed();
        }

        let expected = tasks.len();
        let cancel = CancelToken::new();
        let (tx, rx) = channel::bounded(expected);
        let solver_fn = Arc::new(solver_fn);

        for (solver_id, task_params, strategy) in tasks {
            let problem = Arc::clone(&problem);
            let solver_fn = Arc::clone(&solver_fn);
            let tx = tx.clone();
            let ctx = TaskContext {
                solver_id,
                strategy,
                cancel: cancel.clone(),
            };
            thread::spawn(move || {
                let outcome = solver_fn(&problem, &task_params, &ctx);
                // The aggregator may already have dropped the receiver.
                let _ = tx.send((ctx.solver_id, ctx.strategy, outcome));
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut finishers: Vec<(usize, Option<String>, SolverOutcome<S>)> = Vec::new();
        let mut reported = 0;

        while reported < expected {
            match rx.recv_deadline(deadline) {
                Ok((id, strategy, Ok(outcome))) => {
                    reported += 1;
                    tracing::debug!(solver_id = id, objective = ?outcome.objective_value, "task finished");
                    finishers.push((id, strategy, outcome));
                }
                Ok((id, _, Err(e))) => {
                    reported += 1;
                    tracing::warn!(solver_id = id, error = %e, "solver task failed");
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(pending = expected - reported, "race deadline reached");
                    break;
                }
                // Remaining senders are gone; a panicked task drops its
                // sender without reporting.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        cancel.cancel();

        let winner = finishers.into_iter().min_by(|a, b| {
            let obj_a = a.2.objective_value.unwrap_or(f64::INFINITY);
            let obj_b = b.2.objective_value.unwrap_or(f64::INFINITY);
            obj_a.total_cmp(&obj_b).then_with(|| a.0.cmp(&b.0))
        });

        match winner {
            Some((solver_id, strategy, outcome)) => {
                tracing::info!(solver_id, strategy = ?strategy, objective = ?outcome.objective_value, "race won");
                SolverResult::won(solver_id, strategy, outcome.objective_value, outcome.solution)
            }
            None => {
                tracing::warn!("all solver tasks failed or missed the deadline");
                SolverResult::all_failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(num: usize, timeout_ms: u64) -> ParallelSolver {
        ParallelSolver::new(num, Duration::from_millis(timeout_ms))
    }

    #[test]
    fn lowest_objective_wins() {
        let result = solver(3, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, ctx| Ok(SolverOutcome::new(100.0 + ctx.solver_id as f64, ctx.solver_id)),
        );
        assert!(result.success);
        assert_eq!(result.objective_value, Some(100.0));
        assert_eq!(result.solver_id, Some(0));
        assert_eq!(result.solution, Some(0));
    }

    #[test]
    fn greedy_strategy_wins_regardless_of_position() {
        let strategies = vec![
            Strategy::new("tabu", ParamsOverlay::default()),
            Strategy::new("anneal", ParamsOverlay::default()),
            Strategy::new("greedy", ParamsOverlay::default()),
        ];
        let result = solver(1, 1000).solve_strategies(
            Arc::new(()),
            &GeneratorParams::default(),
            &strategies,
            |_: &(), _, ctx| {
                let objective = if ctx.strategy.as_deref() == Some("greedy") {
                    100.0
                } else {
                    150.0
                };
                Ok(SolverOutcome::new(objective, ()))
            },
        );
        assert!(result.success);
        assert_eq!(result.objective_value, Some(100.0));
        assert_eq!(result.strategy.as_deref(), Some("greedy"));
        assert_eq!(result.solver_id, Some(2));
    }

    #[test]
    fn strategies_override_num_solvers() {
        let strategies = vec![Strategy::new("only", ParamsOverlay::default())];
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let result = solver(8, 1000).solve_strategies(
            Arc::new(()),
            &GeneratorParams::default(),
            &strategies,
            move |_: &(), _, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(SolverOutcome::new(1.0, ()))
            },
        );
        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strategy_overlay_reaches_the_task() {
        let strategies = vec![Strategy::new(
            "wide",
            ParamsOverlay {
                diversification_factor: Some(9.0),
                ..ParamsOverlay::default()
            },
        )];
        let result = solver(1, 1000).solve_strategies(
            Arc::new(()),
            &GeneratorParams::default(),
            &strategies,
            |_: &(), params, _| Ok(SolverOutcome::new(params.diversification_factor, ())),
        );
        assert_eq!(result.objective_value, Some(9.0));
    }

    #[test]
    fn all_tasks_timing_out_fails_the_race() {
        let result: SolverResult<()> = solver(3, 50).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, _| {
                thread::sleep(Duration::from_millis(500));
                Ok(SolverOutcome::new(1.0, ()))
            },
        );
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("All solvers failed"));
        assert!(result.solution.is_none());
    }

    #[test]
    fn failing_task_does_not_fail_the_race() {
        let result = solver(2, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, ctx| {
                if ctx.solver_id == 0 {
                    Err(SchedulerError::Internal("boom".into()))
                } else {
                    Ok(SolverOutcome::new(42.0, ctx.solver_id))
                }
            },
        );
        assert!(result.success);
        assert_eq!(result.solver_id, Some(1));
    }

    #[test]
    fn all_tasks_erroring_fails_the_race() {
        let result: SolverResult<()> = solver(3, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, _| Err(SchedulerError::Internal("boom".into())),
        );
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("All solvers failed"));
    }

    #[test]
    fn panicking_task_is_isolated() {
        let result = solver(2, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, ctx| {
                if ctx.solver_id == 0 {
                    panic!("task panic");
                }
                Ok(SolverOutcome::new(7.0, ctx.solver_id))
            },
        );
        assert!(result.success);
        assert_eq!(result.solver_id, Some(1));
    }

    #[test]
    fn objective_ties_break_to_lowest_id() {
        let result = solver(4, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, ctx| {
                // Let higher ids finish first.
                thread::sleep(Duration::from_millis(40 - 10 * ctx.solver_id as u64));
                Ok(SolverOutcome::new(5.0, ctx.solver_id))
            },
        );
        assert_eq!(result.solver_id, Some(0));
    }

    #[test]
    fn missing_objective_loses_to_any_costed_outcome() {
        let result = solver(2, 1000).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            |_: &(), _, ctx| {
                if ctx.solver_id == 0 {
                    Ok(SolverOutcome {
                        objective_value: None,
                        solution: ctx.solver_id,
                    })
                } else {
                    Ok(SolverOutcome::new(999.0, ctx.solver_id))
                }
            },
        );
        assert_eq!(result.solver_id, Some(1));
    }

    #[test]
    fn stragglers_observe_cancellation() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = Arc::clone(&cancelled);
        let result = solver(2, 200).solve(
            Arc::new(()),
            &GeneratorParams::default(),
            move |_: &(), _, ctx| {
                if ctx.solver_id == 0 {
                    return Ok(SolverOutcome::new(1.0, ()));
                }
                for _ in 0..300 {
                    if ctx.is_cancelled() {
                        observed.store(true, Ordering::SeqCst);
                        return Err(SchedulerError::Cancelled);
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Ok(SolverOutcome::new(0.0, ()))
            },
        );
        assert!(result.success);
        assert_eq!(result.solver_id, Some(0));
        // Give the detached straggler a moment to see the flag.
        thread::sleep(Duration::from_millis(300));
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
