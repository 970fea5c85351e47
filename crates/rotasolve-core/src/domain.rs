//! Domain model for staff rotation scheduling.
//!
//! These are the problem facts an external repository layer supplies:
//! people, rotations they may be assigned to, and the calendar blocks a
//! schedule covers. They carry only the structural fields the pruner and
//! fingerprint need; constraint semantics live with the evaluator.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonType {
    Resident,
    Faculty,
}

/// A schedulable staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub person_type: PersonType,
    /// Postgraduate year; `None` for people the PGY ladder does not apply to.
    #[serde(default)]
    pub pgy_level: Option<u8>,
    #[serde(default)]
    pub specialties: BTreeSet<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, person_type: PersonType) -> Self {
        Self {
            id: id.into(),
            person_type,
            pgy_level: None,
            specialties: BTreeSet::new(),
        }
    }

    pub fn with_pgy_level(mut self, level: u8) -> Self {
        self.pgy_level = Some(level);
        self
    }

    pub fn with_specialties(
        mut self,
        specialties: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        for s in specialties {
            self.specialties.insert(s.into());
        }
        self
    }
}

/// A rotation slot people are assigned to.
///
/// An empty `required_specialties` set and an unset `min_pgy_level` mean
/// "unrestricted" for those rules. `allowed_person_types` must name every
/// eligible type; membership is checked as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    pub id: String,
    #[serde(default)]
    pub allowed_person_types: BTreeSet<PersonType>,
    #[serde(default)]
    pub min_pgy_level: Option<u8>,
    #[serde(default)]
    pub required_specialties: BTreeSet<String>,
}

impl Rotation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            allowed_person_types: BTreeSet::new(),
            min_pgy_level: None,
            required_specialties: BTreeSet::new(),
        }
    }

    pub fn with_allowed_types(mut self, types: impl IntoIterator<Item = PersonType>) -> Self {
        self.allowed_person_types.extend(types);
        self
    }

    pub fn with_min_pgy_level(mut self, level: u8) -> Self {
        self.min_pgy_level = Some(level);
        self
    }

    pub fn with_required_specialties(
        mut self,
        specialties: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        for s in specialties {
            self.required_specialties.insert(s.into());
        }
        self
    }
}

/// One calendar slot a schedule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
}

impl Block {
    pub fn new(id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            date,
            half_day: false,
        }
    }
}

/// An inclusive date window, used as the key for partial-solution memos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}
