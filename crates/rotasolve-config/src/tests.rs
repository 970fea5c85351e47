//! Tests for engine configuration.

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        [solver]
        num_solvers = 6
        timeout_seconds = 45.0

        [adapter]
        stagnation_window = 7
        stagnation_epsilon = 0.02
        near_feasible_threshold = 0.85

        [controller]
        max_iterations = 12
        time_budget_seconds = 300.0
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.solver.num_solvers, 6);
    assert_eq!(config.solver.timeout_seconds, 45.0);
    assert_eq!(config.adapter.stagnation_window, 7);
    assert_eq!(config.adapter.near_feasible_threshold, 0.85);
    assert_eq!(config.controller.max_iterations, 12);
    assert_eq!(
        config.controller.time_budget(),
        Some(Duration::from_secs(300))
    );
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        solver:
          num_solvers: 2
          timeout_seconds: 10.0
        adapter:
          timeout_factor: 3.0
        controller:
          max_iterations: 5
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.solver.num_solvers, 2);
    assert_eq!(config.adapter.timeout_factor, 3.0);
    assert_eq!(config.controller.max_iterations, 5);
}

#[test]
fn test_defaults_fill_missing_sections() {
    let config = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(config.solver.num_solvers, 4);
    assert_eq!(config.adapter.stagnation_window, 5);
    assert_eq!(config.adapter.near_feasible_threshold, 0.8);
    assert_eq!(config.adapter.timeout_factor, 2.0);
    assert_eq!(config.controller.max_iterations, 10);
    assert!(config.controller.time_budget_seconds.is_none());
}

#[test]
fn test_builder() {
    let config = EngineConfig::new()
        .with_num_solvers(8)
        .with_solver_timeout_seconds(15.0)
        .with_max_iterations(3);
    assert_eq!(config.solver.num_solvers, 8);
    assert_eq!(config.solver.timeout(), Duration::from_secs(15));
    assert_eq!(config.controller.max_iterations, 3);
    config.validate().unwrap();
}

#[test]
fn test_validate_rejects_zero_solvers() {
    let config = EngineConfig::new().with_num_solvers(0);
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_validate_rejects_bad_threshold() {
    let mut config = EngineConfig::new();
    config.adapter.near_feasible_threshold = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_non_shrinking_narrow_factor() {
    let mut config = EngineConfig::new();
    config.adapter.narrow_factor = 1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_timeout_factor_at_one() {
    let mut config = EngineConfig::new();
    config.adapter.timeout_factor = 1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_missing_file_errors() {
    let err = EngineConfig::load("does-not-exist.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
