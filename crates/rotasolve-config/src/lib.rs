//! Configuration system for Rotasolve.
//!
//! Load engine configuration from TOML or YAML files to control the
//! parallel race, the adaptation thresholds, and the iteration budget
//! without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use rotasolve_config::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [solver]
//!     num_solvers = 3
//!     timeout_seconds = 20.0
//!
//!     [adapter]
//!     stagnation_window = 5
//!     near_feasible_threshold = 0.85
//!
//!     [controller]
//!     max_iterations = 8
//! "#).unwrap();
//!
//! assert_eq!(config.solver.num_solvers, 3);
//! assert_eq!(config.solver.timeout(), Duration::from_secs(20));
//! assert_eq!(config.controller.max_iterations, 8);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use rotasolve_config::EngineConfig;
//!
//! let config = EngineConfig::load("engine.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Parallel race settings.
    #[serde(default)]
    pub solver: SolverSettings,

    /// Adaptation rule thresholds.
    #[serde(default)]
    pub adapter: AdapterSettings,

    /// Outer iteration loop budget.
    #[serde(default)]
    pub controller: ControllerSettings,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_num_solvers(mut self, n: usize) -> Self {
        self.solver.num_solvers = n;
        self
    }

    pub fn with_solver_timeout_seconds(mut self, seconds: f64) -> Self {
        self.solver.timeout_seconds = seconds;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.controller.max_iterations = n;
        self
    }

    /// Checks the configuration for nonsensical values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.num_solvers == 0 {
            return Err(ConfigError::Invalid(
                "solver.num_solvers must be at least 1".into(),
            ));
        }
        if !(self.solver.timeout_seconds > 0.0) {
            return Err(ConfigError::Invalid(
                "solver.timeout_seconds must be positive".into(),
            ));
        }
        if self.controller.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "controller.max_iterations must be at least 1".into(),
            ));
        }
        self.adapter.validate()
    }
}

/// Settings for the parallel strategy race.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverSettings {
    /// Number of concurrent solver tasks when no explicit strategies are given.
    #[serde(default = "default_num_solvers")]
    pub num_solvers: usize,

    /// Shared wall-clock deadline per attempt, in seconds.
    #[serde(default = "default_solver_timeout")]
    pub timeout_seconds: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            num_solvers: default_num_solvers(),
            timeout_seconds: default_solver_timeout(),
        }
    }
}

impl SolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// Thresholds for the built-in adaptation rules.
///
/// The stagnation and near-feasible cutoffs are deliberately configuration,
/// not constants; the defaults match observed production behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdapterSettings {
    /// Trailing iterations inspected for stagnation. Below this many
    /// records, stagnation never fires.
    #[serde(default = "default_stagnation_window")]
    pub stagnation_window: usize,

    /// Maximum score spread within the window that still counts as flat.
    #[serde(default = "default_stagnation_epsilon")]
    pub stagnation_epsilon: f64,

    /// Score at or above which an invalid result counts as near-feasible.
    #[serde(default = "default_near_feasible_threshold")]
    pub near_feasible_threshold: f64,

    /// Fraction of the attempt timeout that counts as "ran out of time".
    #[serde(default = "default_timeout_pressure_ratio")]
    pub timeout_pressure_ratio: f64,

    /// Multiplier applied when increasing the timeout.
    #[serde(default = "default_timeout_factor")]
    pub timeout_factor: f64,

    /// Upper bound for the adapted timeout, in seconds.
    #[serde(default = "default_max_timeout")]
    pub max_timeout_seconds: f64,

    /// Multiplier applied when raising diversification.
    #[serde(default = "default_diversification_step")]
    pub diversification_step: f64,

    /// Multiplier applied when raising a constraint weight.
    #[serde(default = "default_weight_step")]
    pub weight_step: f64,

    /// Shrink factor for neighborhood and diversification when narrowing.
    #[serde(default = "default_narrow_factor")]
    pub narrow_factor: f64,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            stagnation_window: default_stagnation_window(),
            stagnation_epsilon: default_stagnation_epsilon(),
            near_feasible_threshold: default_near_feasible_threshold(),
            timeout_pressure_ratio: default_timeout_pressure_ratio(),
            timeout_factor: default_timeout_factor(),
            max_timeout_seconds: default_max_timeout(),
            diversification_step: default_diversification_step(),
            weight_step: default_weight_step(),
            narrow_factor: default_narrow_factor(),
        }
    }
}

impl AdapterSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stagnation_window < 2 {
            return Err(ConfigError::Invalid(
                "adapter.stagnation_window must be at least 2".into(),
            ));
        }
        if !(self.stagnation_epsilon > 0.0) {
            return Err(ConfigError::Invalid(
                "adapter.stagnation_epsilon must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.near_feasible_threshold) {
            return Err(ConfigError::Invalid(
                "adapter.near_feasible_threshold must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.timeout_pressure_ratio) {
            return Err(ConfigError::Invalid(
                "adapter.timeout_pressure_ratio must be in [0, 1]".into(),
            ));
        }
        for (name, factor) in [
            ("adapter.timeout_factor", self.timeout_factor),
            ("adapter.diversification_step", self.diversification_step),
            ("adapter.weight_step", self.weight_step),
        ] {
            if !(factor > 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be greater than 1"
                )));
            }
        }
        if !(self.narrow_factor > 0.0 && self.narrow_factor < 1.0) {
            return Err(ConfigError::Invalid(
                "adapter.narrow_factor must be in (0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// Budget for the outer iteration loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ControllerSettings {
    /// Maximum optimization iterations per session.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Optional wall-clock budget for the whole session, in seconds.
    #[serde(default)]
    pub time_budget_seconds: Option<f64>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            time_budget_seconds: None,
        }
    }
}

impl ControllerSettings {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_seconds.map(Duration::from_secs_f64)
    }
}

fn default_num_solvers() -> usize {
    4
}

fn default_solver_timeout() -> f64 {
    30.0
}

fn default_stagnation_window() -> usize {
    5
}

fn default_stagnation_epsilon() -> f64 {
    0.01
}

fn default_near_feasible_threshold() -> f64 {
    0.8
}

fn default_timeout_pressure_ratio() -> f64 {
    0.9
}

fn default_timeout_factor() -> f64 {
    2.0
}

fn default_max_timeout() -> f64 {
    600.0
}

fn default_diversification_step() -> f64 {
    1.5
}

fn default_weight_step() -> f64 {
    1.5
}

fn default_narrow_factor() -> f64 {
    0.5
}

fn default_max_iterations() -> usize {
    10
}

#[cfg(test)]
mod tests;
