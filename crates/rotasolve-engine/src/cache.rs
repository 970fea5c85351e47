//! Content-addressed solution memoization.
//!
//! Problems are fingerprinted by a canonical SHA-256 digest; solutions
//! and windowed partial solutions are memoized under that digest. The
//! cache is a pure optimization: every failure path degrades to a miss
//! and nothing in the solving path depends on it.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};

use rotasolve_core::{Block, DateRange, Person, Rotation};

/// Computes the canonical 64-hex fingerprint of a problem instance.
///
/// Entity lists are sorted by id before serialization so caller ordering
/// never leaks into the digest; JSON object keys serialize sorted. The
/// contract: semantically identical input gives an identical digest, and
/// changing any field (including a single constraint value) changes it.
///
/// # Example
///
/// ```
/// use rotasolve_engine::cache::problem_fingerprint;
/// use serde_json::json;
///
/// let a = problem_fingerprint(&[], &[], &[], &json!({"max_hours_per_week": 80}));
/// let b = problem_fingerprint(&[], &[], &[], &json!({"max_hours_per_week": 70}));
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, b);
/// ```
pub fn problem_fingerprint(
    persons: &[Person],
    rotations: &[Rotation],
    blocks: &[Block],
    constraints: &Value,
) -> String {
    let mut persons: Vec<&Person> = persons.iter().collect();
    persons.sort_by(|a, b| a.id.cmp(&b.id));
    let mut rotations: Vec<&Rotation> = rotations.iter().collect();
    rotations.sort_by(|a, b| a.id.cmp(&b.id));
    let mut blocks: Vec<&Block> = blocks.iter().collect();
    blocks.sort_by(|a, b| a.id.cmp(&b.id));

    let canonical = serde_json::json!({
        "persons": persons,
        "rotations": rotations,
        "blocks": blocks,
        "constraints": constraints,
    });

    let serialized = match serde_json::to_string(&canonical) {
        Ok(s) => s,
        Err(e) => {
            // Unreachable for these types; fall back to a still-deterministic input.
            tracing::warn!(error = %e, "canonical serialization failed");
            format!("{canonical:?}")
        }
    };

    let digest = Sha256::digest(serialized.as_bytes());
    format!("{digest:x}")
}

/// Concurrent memo store for solved schedules.
///
/// Keys are problem fingerprints; partial solutions additionally carry an
/// explicit [`DateRange`] window so overlapping sub-horizons can reuse
/// work. Reads clone the stored value under a read lock, so a torn value
/// is never observable. Misses return `None`, never an error.
#[derive(Debug)]
pub struct SolutionCache<S> {
    solutions: RwLock<HashMap<String, S>>,
    partials: RwLock<HashMap<(String, DateRange), S>>,
}

impl<S> Default for SolutionCache<S> {
    fn default() -> Self {
        Self {
            solutions: RwLock::new(HashMap::new()),
            partials: RwLock::new(HashMap::new()),
        }
    }
}

impl<S: Clone> SolutionCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the full solution for a fingerprint.
    pub fn get_solution(&self, fingerprint: &str) -> Option<S> {
        let hit = self.solutions.read().get(fingerprint).cloned();
        tracing::debug!(fingerprint, hit = hit.is_some(), "solution cache probe");
        hit
    }

    /// Stores a full solution for a fingerprint.
    pub fn put_solution(&self, fingerprint: impl Into<String>, solution: S) {
        self.solutions.write().insert(fingerprint.into(), solution);
    }

    /// Looks up a windowed partial solution.
    pub fn get_partial_solution(&self, fingerprint: &str, range: DateRange) -> Option<S> {
        self.partials
            .read()
            .get(&(fingerprint.to_string(), range))
            .cloned()
    }

    /// Stores a windowed partial solution.
    pub fn put_partial_solution(&self, fingerprint: impl Into<String>, range: DateRange, solution: S) {
        self.partials
            .write()
            .insert((fingerprint.into(), range), solution);
    }

    /// Number of full solutions currently memoized.
    pub fn entry_count(&self) -> usize {
        self.solutions.read().len()
    }

    /// Drops everything, full and partial.
    pub fn clear(&self) {
        self.solutions.write().clear();
        self.partials.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rotasolve_core::PersonType;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_problem() -> (Vec<Person>, Vec<Rotation>, Vec<Block>) {
        let persons = vec![
            Person::new("r1", PersonType::Resident).with_pgy_level(2),
            Person::new("f1", PersonType::Faculty),
        ];
        let rotations = vec![Rotation::new("icu").with_allowed_types([PersonType::Resident])];
        let blocks = vec![Block::new("b1", date("2026-07-01"))];
        (persons, rotations, blocks)
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let (p, r, b) = sample_problem();
        let constraints = json!({"max_hours_per_week": 80});
        let h1 = problem_fingerprint(&p, &r, &b, &constraints);
        let h2 = problem_fingerprint(&p, &r, &b, &constraints);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn fingerprint_ignores_input_ordering() {
        let (mut p, r, b) = sample_problem();
        let constraints = json!({"max_hours_per_week": 80});
        let h1 = problem_fingerprint(&p, &r, &b, &constraints);
        p.reverse();
        let h2 = problem_fingerprint(&p, &r, &b, &constraints);
        assert_eq!(h1, h2);
    }

    #[test]
    fn constraint_change_changes_fingerprint() {
        let (p, r, b) = sample_problem();
        let h80 = problem_fingerprint(&p, &r, &b, &json!({"max_hours_per_week": 80}));
        let h70 = problem_fingerprint(&p, &r, &b, &json!({"max_hours_per_week": 70}));
        assert_ne!(h80, h70);
    }

    #[test]
    fn person_field_change_changes_fingerprint() {
        let (mut p, r, b) = sample_problem();
        let constraints = json!({});
        let h1 = problem_fingerprint(&p, &r, &b, &constraints);
        p[0].pgy_level = Some(3);
        let h2 = problem_fingerprint(&p, &r, &b, &constraints);
        assert_ne!(h1, h2);
    }

    #[test]
    fn solution_roundtrip() {
        let cache: SolutionCache<Vec<u32>> = SolutionCache::new();
        cache.put_solution("abc", vec![1, 2, 3]);
        assert_eq!(cache.get_solution("abc"), Some(vec![1, 2, 3]));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn unknown_key_is_a_miss() {
        let cache: SolutionCache<Vec<u32>> = SolutionCache::new();
        assert_eq!(cache.get_solution("missing"), None);
    }

    #[test]
    fn partial_solutions_are_window_keyed() {
        let cache: SolutionCache<&'static str> = SolutionCache::new();
        let july = DateRange::new(date("2026-07-01"), date("2026-07-14"));
        let august = DateRange::new(date("2026-08-01"), date("2026-08-14"));
        cache.put_partial_solution("abc", july, "july-window");
        assert_eq!(cache.get_partial_solution("abc", july), Some("july-window"));
        assert_eq!(cache.get_partial_solution("abc", august), None);
        assert_eq!(cache.get_partial_solution("other", july), None);
    }

    #[test]
    fn clear_drops_both_stores() {
        let cache: SolutionCache<u8> = SolutionCache::new();
        cache.put_solution("a", 1);
        cache.put_partial_solution("a", DateRange::new(date("2026-07-01"), date("2026-07-02")), 2);
        cache.clear();
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(
            cache.get_partial_solution(
                "a",
                DateRange::new(date("2026-07-01"), date("2026-07-02"))
            ),
            None
        );
    }

    #[test]
    fn concurrent_readers_and_writers() {
        use std::sync::Arc;

        let cache: Arc<SolutionCache<u64>> = Arc::new(SolutionCache::new());
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100u64 {
                    cache.put_solution(format!("k{}", i % 10), t * 1000 + i);
                    let _ = cache.get_solution(&format!("k{}", i % 10));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.entry_count(), 10);
    }
}
