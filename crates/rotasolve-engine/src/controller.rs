//! Iteration driver.
//!
//! Runs one optimization session strictly sequentially: prune once, then
//! repeat solve → evaluate → adapt until a valid schedule appears or the
//! iteration/time budget runs out. Always hands back the best schedule
//! seen plus the full history, even when nothing valid was found.
//! Independent sessions may run concurrently against a shared cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use rotasolve_config::EngineConfig;
use rotasolve_core::{
    Block, EvaluationResult, GeneratorParams, History, IterationRecord, Person, Rotation,
    ScheduleEvaluator, SchedulerError, SolverOutcome,
};

use crate::adapter::ParameterAdapter;
use crate::cache::{problem_fingerprint, SolutionCache};
use crate::parallel::{ParallelSolver, Strategy, TaskContext};
use crate::pruner::{prune, PruningResult};

/// A problem instance as supplied by the embedding application.
pub trait ScheduleProblem: Send + Sync {
    fn persons(&self) -> &[Person];
    fn rotations(&self) -> &[Rotation];
    fn blocks(&self) -> &[Block];
    /// Constraint configuration, part of the cache fingerprint.
    fn constraints(&self) -> Value;
}

/// Plain-record implementation of [`ScheduleProblem`].
#[derive(Debug, Clone, Default)]
pub struct ProblemInstance {
    pub persons: Vec<Person>,
    pub rotations: Vec<Rotation>,
    pub blocks: Vec<Block>,
    pub constraints: Value,
}

impl ScheduleProblem for ProblemInstance {
    fn persons(&self) -> &[Person] {
        &self.persons
    }

    fn rotations(&self) -> &[Rotation] {
        &self.rotations
    }

    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn constraints(&self) -> Value {
        self.constraints.clone()
    }
}

/// What each solver task receives: the shared problem plus the pruning
/// result its search should respect.
#[derive(Debug)]
pub struct SolveRequest<P> {
    pub problem: Arc<P>,
    pub pruning: Arc<PruningResult>,
}

/// Result of a whole optimization session.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome<S> {
    /// Best schedule across all iterations; possibly still invalid.
    pub best_solution: Option<S>,
    pub best_evaluation: Option<EvaluationResult>,
    pub valid: bool,
    pub iterations_run: usize,
    pub history: History,
    pub final_params: GeneratorParams,
    pub cache_hit: bool,
    pub pruning: PruningResult,
    pub fingerprint: String,
}

/// Drives prune → solve → evaluate → adapt for one session.
#[derive(Debug)]
pub struct IterationController<S> {
    solver: ParallelSolver,
    adapter: ParameterAdapter,
    cache: Arc<SolutionCache<S>>,
    max_iterations: usize,
    time_budget: Option<Duration>,
    strategies: Option<Vec<Strategy>>,
}

impl<S: Clone + Send + 'static> IterationController<S> {
    /// Builds a controller from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails fast with [`SchedulerError::Config`] when the configuration
    /// is invalid, so bad values never reach the solving path.
    pub fn new(
        config: &EngineConfig,
        cache: Arc<SolutionCache<S>>,
    ) -> Result<Self, SchedulerError> {
        config
            .validate()
            .map_err(|e| SchedulerError::Config(e.to_string()))?;
        Ok(Self {
            solver: ParallelSolver::from_settings(&config.solver),
            adapter: ParameterAdapter::new(config.adapter.clone()),
            cache,
            max_iterations: config.controller.max_iterations,
            time_budget: config.controller.time_budget(),
            strategies: None,
        })
    }

    /// Replaces the adapter, e.g. one carrying custom rules.
    pub fn with_adapter(mut self, adapter: ParameterAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    /// Races these strategies each iteration instead of `num_solvers`
    /// identical tasks.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Runs one optimization session to completion.
    pub fn run<P, F>(
        &self,
        problem: Arc<P>,
        initial_params: GeneratorParams,
        evaluator: &dyn ScheduleEvaluator<S>,
        solver_fn: F,
    ) -> OptimizationOutcome<S>
    where
        P: ScheduleProblem + 'static,
        F: Fn(&SolveRequest<P>, &GeneratorParams, &TaskContext) -> Result<SolverOutcome<S>, SchedulerError>
            + Send
            + Sync
            + 'static,
    {
        let session_started = Instant::now();
        let pruning = Arc::new(prune(problem.persons(), problem.rotations(), problem.blocks()));
        let fingerprint = problem_fingerprint(
            problem.persons(),
            problem.rotations(),
            problem.blocks(),
            &problem.constraints(),
        );

        let mut params = initial_params;
        let mut history = History::new();
        let mut best: Option<(S, EvaluationResult)> = None;

        if let Some(cached) = self.cache.get_solution(&fingerprint) {
            let evaluation = evaluator.evaluate(&cached);
            if evaluation.valid {
                tracing::info!(%fingerprint, "returning cached valid schedule");
                return OptimizationOutcome {
                    best_solution: Some(cached),
                    best_evaluation: Some(evaluation),
                    valid: true,
                    iterations_run: 0,
                    history,
                    final_params: params,
                    cache_hit: true,
                    pruning: (*pruning).clone(),
                    fingerprint,
                };
            }
            // Constraints may have tightened since it was cached; keep it
            // only as the incumbent.
            best = Some((cached, evaluation));
        }

        let request = Arc::new(SolveRequest {
            problem,
            pruning: Arc::clone(&pruning),
        });
        let solver_fn = Arc::new(solver_fn);
        let mut valid = false;

        for iteration in 0..self.max_iterations {
            if let Some(budget) = self.time_budget {
                if session_started.elapsed() >= budget {
                    tracing::warn!(iteration, "session time budget exhausted");
                    break;
                }
            }

            let mut solver = self.solver.clone();
            match Duration::try_from_secs_f64(params.timeout_seconds) {
                Ok(timeout) => solver.set_timeout(timeout),
                Err(_) => {
                    tracing::warn!(
                        timeout_seconds = params.timeout_seconds,
                        "unusable attempt timeout; keeping configured deadline"
                    );
                }
            }

            let task_fn = {
                let solver_fn = Arc::clone(&solver_fn);
                move |request: &SolveRequest<P>, params: &GeneratorParams, ctx: &TaskContext| {
                    solver_fn(request, params, ctx)
                }
            };

            let attempt_started = Instant::now();
            let attempt = match &self.strategies {
                Some(strategies) => {
                    solver.solve_strategies(Arc::clone(&request), &params, strategies, task_fn)
                }
                None => solver.solve(Arc::clone(&request), &params, task_fn),
            };
            let duration = attempt_started.elapsed().as_secs_f64();

            let evaluation = match attempt.solution {
                Some(solution) => {
                    let evaluation = evaluator.evaluate(&solution);
                    let improved = best
                        .as_ref()
                        .map_or(true, |(_, incumbent)| evaluation.score > incumbent.score);
                    if improved {
                        best = Some((solution.clone(), evaluation.clone()));
                    }
                    if evaluation.valid {
                        self.cache.put_solution(fingerprint.clone(), solution);
                        valid = true;
                    }
                    evaluation
                }
                None => {
                    // Record the failed attempt so the adapter can react to it.
                    tracing::warn!(iteration, "attempt produced no schedule");
                    EvaluationResult::failed_attempt()
                }
            };

            history.push(IterationRecord::from_evaluation(
                iteration, &params, &evaluation, duration,
            ));
            tracing::info!(
                iteration,
                score = evaluation.score,
                valid = evaluation.valid,
                duration_seconds = duration,
                "iteration complete"
            );

            if valid {
                break;
            }
            params = self.adapter.adapt(&params, &evaluation, &history);
        }

        let iterations_run = history.len();
        let (best_solution, best_evaluation) = match best {
            Some((solution, evaluation)) => (Some(solution), Some(evaluation)),
            None => (None, None),
        };

        OptimizationOutcome {
            best_solution,
            best_evaluation,
            valid,
            iterations_run,
            history,
            final_params: params,
            cache_hit: false,
            pruning: (*pruning).clone(),
            fingerprint,
        }
    }
}
