//! Solver parameters and the algorithm cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Solving strategy families the generator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Greedy,
    CpSat,
    Pulp,
    Hybrid,
}

impl Algorithm {
    /// All algorithms in cycle order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Greedy,
        Algorithm::CpSat,
        Algorithm::Pulp,
        Algorithm::Hybrid,
    ];

    /// Successor in the fixed rotation `greedy → cp_sat → pulp → hybrid → greedy`.
    ///
    /// # Example
    ///
    /// ```
    /// use rotasolve_core::Algorithm;
    ///
    /// assert_eq!(Algorithm::Greedy.next(), Algorithm::CpSat);
    /// assert_eq!(Algorithm::Hybrid.next(), Algorithm::Greedy);
    /// ```
    pub fn next(self) -> Algorithm {
        match self {
            Algorithm::Greedy => Algorithm::CpSat,
            Algorithm::CpSat => Algorithm::Pulp,
            Algorithm::Pulp => Algorithm::Hybrid,
            Algorithm::Hybrid => Algorithm::Greedy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::CpSat => "cp_sat",
            Algorithm::Pulp => "pulp",
            Algorithm::Hybrid => "hybrid",
        }
    }
}

/// Tunable parameters for one solve attempt.
///
/// The adapter returns a fresh copy on every call; callers never see a
/// parameter set mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub algorithm: Algorithm,
    /// Wall-clock budget for one attempt, in seconds.
    pub timeout_seconds: f64,
    /// How far heuristic search perturbs from its current solution.
    pub diversification_factor: f64,
    /// Candidate-move neighborhood size for local search.
    pub neighborhood_size: u32,
    /// Per-constraint weight multipliers; absent means 1.0.
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, f64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Greedy,
            timeout_seconds: 30.0,
            diversification_factor: 1.0,
            neighborhood_size: 50,
            constraint_weights: BTreeMap::new(),
        }
    }
}

impl GeneratorParams {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn with_timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_diversification_factor(mut self, factor: f64) -> Self {
        self.diversification_factor = factor;
        self
    }

    pub fn with_neighborhood_size(mut self, size: u32) -> Self {
        self.neighborhood_size = size;
        self
    }

    pub fn with_constraint_weight(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.constraint_weights.insert(name.into(), weight);
        self
    }

    /// Weight multiplier for a constraint, 1.0 when not set.
    pub fn constraint_weight(&self, name: &str) -> f64 {
        self.constraint_weights.get(name).copied().unwrap_or(1.0)
    }
}

/// Partial parameter override merged over a base [`GeneratorParams`].
///
/// Used to describe one strategy in a parallel race: only the fields a
/// strategy sets differ from the shared base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsOverlay {
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    #[serde(default)]
    pub diversification_factor: Option<f64>,
    #[serde(default)]
    pub neighborhood_size: Option<u32>,
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, f64>,
}

impl ParamsOverlay {
    pub fn algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm: Some(algorithm),
            ..Self::default()
        }
    }

    /// Applies this overlay on top of `base`, returning the merged params.
    pub fn merge_over(&self, base: &GeneratorParams) -> GeneratorParams {
        let mut merged = base.clone();
        if let Some(algorithm) = self.algorithm {
            merged.algorithm = algorithm;
        }
        if let Some(timeout) = self.timeout_seconds {
            merged.timeout_seconds = timeout;
        }
        if let Some(diversification) = self.diversification_factor {
            merged.diversification_factor = diversification;
        }
        if let Some(size) = self.neighborhood_size {
            merged.neighborhood_size = size;
        }
        for (name, weight) in &self.constraint_weights {
            merged.constraint_weights.insert(name.clone(), *weight);
        }
        merged
    }
}
