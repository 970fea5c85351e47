//! Append-only iteration history.
//!
//! The controller owns the history and appends one record per attempt.
//! The adapter only ever sees `&History`; records are never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationResult;
use crate::params::GeneratorParams;

/// Snapshot of one optimization attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub timestamp: DateTime<Utc>,
    /// Parameters the attempt ran with.
    pub params: GeneratorParams,
    pub score: f64,
    pub valid: bool,
    pub critical_violations: usize,
    pub total_violations: usize,
    /// Distinct violation types seen, for the adapter's type-keyed rules.
    pub violation_types: Vec<String>,
    pub duration_seconds: f64,
}

impl IterationRecord {
    /// Builds a record from an attempt's inputs and its evaluation.
    pub fn from_evaluation(
        iteration: usize,
        params: &GeneratorParams,
        result: &EvaluationResult,
        duration_seconds: f64,
    ) -> Self {
        let mut violation_types: Vec<String> = result
            .violations
            .iter()
            .map(|v| v.violation_type.clone())
            .collect();
        violation_types.sort();
        violation_types.dedup();

        Self {
            iteration,
            timestamp: Utc::now(),
            params: params.clone(),
            score: result.score,
            valid: result.valid,
            critical_violations: result.critical_violations,
            total_violations: result.total_violations,
            violation_types,
            duration_seconds,
        }
    }
}

/// Ordered, append-only sequence of [`IterationRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    records: Vec<IterationRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Records arrive in iteration order and stay there.
    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IterationRecord> {
        self.records.iter()
    }

    /// Trailing window of at most `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[IterationRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Record with the highest score so far.
    pub fn best(&self) -> Option<&IterationRecord> {
        self.records
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}
