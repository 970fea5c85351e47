//! Rule-based parameter adaptation.
//!
//! A small priority rule engine that maps the latest evaluation and the
//! iteration history to the next attempt's [`GeneratorParams`]. Rules are
//! plain values holding a predicate and a closed [`Action`] variant; the
//! first matching rule in priority order wins, so priority doubles as
//! conflict resolution. The adapter never mutates its inputs and always
//! returns a fresh parameter set.

mod builtin;

pub use builtin::{EIGHTY_HOUR_VIOLATION, N1_VULNERABILITY, RESILIENCE_WEIGHT};

use std::fmt;
use std::sync::Arc;

use rotasolve_config::AdapterSettings;
use rotasolve_core::{EvaluationResult, GeneratorParams, History, Result, SchedulerError};

/// Predicate over the latest evaluation and the full history.
pub type RuleCondition = Arc<dyn Fn(&EvaluationResult, &History) -> bool + Send + Sync>;

/// What a matched rule does to the parameters. Closed set; malformed
/// parameters are rejected at registration, never at `adapt` time.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Advance to the next algorithm in the fixed cycle.
    SwitchAlgorithm,
    /// Multiply the attempt timeout, capped by the configured maximum.
    IncreaseTimeout { factor: f64 },
    /// Multiply the diversification factor.
    IncreaseDiversification { factor: f64 },
    /// Shrink neighborhood size and diversification toward the incumbent.
    NarrowSearch { factor: f64 },
    /// Multiply one named constraint weight (baseline 1.0 when unset).
    IncreaseConstraintWeight { name: String, factor: f64 },
}

impl Action {
    fn validate(&self) -> Result<()> {
        let reject = |msg: String| Err(SchedulerError::RuleRegistration(msg));
        match self {
            Action::SwitchAlgorithm => Ok(()),
            Action::IncreaseTimeout { factor }
            | Action::IncreaseDiversification { factor } => {
                if !factor.is_finite() || *factor <= 1.0 {
                    return reject(format!("increase factor must be finite and > 1, got {factor}"));
                }
                Ok(())
            }
            Action::NarrowSearch { factor } => {
                if !factor.is_finite() || *factor <= 0.0 || *factor >= 1.0 {
                    return reject(format!("narrow factor must be in (0, 1), got {factor}"));
                }
                Ok(())
            }
            Action::IncreaseConstraintWeight { name, factor } => {
                if name.is_empty() {
                    return reject("constraint weight name must not be empty".into());
                }
                if !factor.is_finite() || *factor <= 1.0 {
                    return reject(format!("weight factor must be finite and > 1, got {factor}"));
                }
                Ok(())
            }
        }
    }
}

/// One adaptation rule: a named predicate with a priority and an action.
#[derive(Clone)]
pub struct AdaptationRule {
    pub name: String,
    /// Higher priorities are evaluated first.
    pub priority: i32,
    pub action: Action,
    condition: RuleCondition,
    /// Custom rules precede built-ins of equal priority.
    custom: bool,
}

impl fmt::Debug for AdaptationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptationRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("action", &self.action)
            .field("custom", &self.custom)
            .finish()
    }
}

impl AdaptationRule {
    /// Creates a custom rule. Validation happens when the rule is
    /// registered with [`ParameterAdapter::with_rule`].
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        condition: RuleCondition,
        action: Action,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            action,
            condition,
            custom: true,
        }
    }

    pub(crate) fn builtin(
        name: &str,
        priority: i32,
        condition: RuleCondition,
        action: Action,
    ) -> Self {
        Self {
            name: name.to_string(),
            priority,
            action,
            condition,
            custom: false,
        }
    }

    fn matches(&self, result: &EvaluationResult, history: &History) -> bool {
        (self.condition)(result, history)
    }
}

/// Converts `(latest evaluation, history)` into the next attempt's
/// parameters by scanning rules in priority order and applying the first
/// match. No match returns an unchanged copy.
///
/// # Example
///
/// ```
/// use rotasolve_config::AdapterSettings;
/// use rotasolve_core::{EvaluationResult, GeneratorParams, History};
/// use rotasolve_engine::adapter::ParameterAdapter;
///
/// let adapter = ParameterAdapter::new(AdapterSettings::default());
/// let params = GeneratorParams::default();
/// let mediocre = EvaluationResult {
///     score: 0.5,
///     ..EvaluationResult::failed_attempt()
/// };
///
/// let next = adapter.adapt(&params, &mediocre, &History::new());
/// assert_eq!(next, params);
/// ```
pub struct ParameterAdapter {
    settings: AdapterSettings,
    rules: Vec<AdaptationRule>,
}

impl fmt::Debug for ParameterAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterAdapter")
            .field("rules", &self.rules)
            .finish()
    }
}

impl Default for ParameterAdapter {
    fn default() -> Self {
        Self::new(AdapterSettings::default())
    }
}

impl ParameterAdapter {
    /// Creates an adapter with the built-in rule set.
    pub fn new(settings: AdapterSettings) -> Self {
        let rules = builtin::builtin_rules(&settings);
        let mut adapter = Self { settings, rules };
        adapter.sort_rules();
        adapter
    }

    /// Registers a custom rule.
    ///
    /// # Errors
    ///
    /// Fails fast with [`SchedulerError::RuleRegistration`] on an empty
    /// name or malformed action parameters; a bad rule never reaches
    /// `adapt`.
    pub fn with_rule(mut self, rule: AdaptationRule) -> Result<Self> {
        if rule.name.is_empty() {
            return Err(SchedulerError::RuleRegistration(
                "rule name must not be empty".into(),
            ));
        }
        rule.action.validate()?;
        self.rules.push(rule);
        self.sort_rules();
        Ok(self)
    }

    /// Rule names in evaluation order, highest priority first.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    fn sort_rules(&mut self) {
        // Stable sort keeps registration order among full ties.
        self.rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.custom.cmp(&a.custom))
        });
    }

    /// Applies the first matching rule and returns the adapted parameters.
    pub fn adapt(
        &self,
        params: &GeneratorParams,
        result: &EvaluationResult,
        history: &History,
    ) -> GeneratorParams {
        for rule in &self.rules {
            if rule.matches(result, history) {
                tracing::info!(
                    rule = %rule.name,
                    priority = rule.priority,
                    action = ?rule.action,
                    "adaptation rule fired"
                );
                return self.apply(&rule.action, params);
            }
        }
        tracing::debug!("no adaptation rule matched; params unchanged");
        params.clone()
    }

    /// True when the trailing score window is flat: at least
    /// `stagnation_window` records whose scores cluster within
    /// `stagnation_epsilon` with no net upward trend.
    pub fn is_stagnating(&self, _result: &EvaluationResult, history: &History) -> bool {
        builtin::stagnating(
            history,
            self.settings.stagnation_window,
            self.settings.stagnation_epsilon,
        )
    }

    /// True when the result scores at or above the near-feasible
    /// threshold but is not yet valid.
    pub fn is_near_feasible(&self, result: &EvaluationResult, _history: &History) -> bool {
        builtin::near_feasible(result, self.settings.near_feasible_threshold)
    }

    fn apply(&self, action: &Action, params: &GeneratorParams) -> GeneratorParams {
        let mut next = params.clone();
        match action {
            Action::SwitchAlgorithm => {
                next.algorithm = params.algorithm.next();
            }
            Action::IncreaseTimeout { factor } => {
                next.timeout_seconds =
                    (params.timeout_seconds * factor).min(self.settings.max_timeout_seconds);
            }
            Action::IncreaseDiversification { factor } => {
                next.diversification_factor = params.diversification_factor * factor;
            }
            Action::NarrowSearch { factor } => {
                let shrunk = (params.neighborhood_size as f64 * factor).floor();
                next.neighborhood_size = (shrunk as u32).max(1);
                next.diversification_factor = params.diversification_factor * factor;
            }
            Action::IncreaseConstraintWeight { name, factor } => {
                let current = params.constraint_weight(name);
                next.constraint_weights.insert(name.clone(), current * factor);
            }
        }
        next
    }
}
