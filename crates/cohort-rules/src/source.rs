//! Extraction collaborator boundary.
//!
//! The core never touches a data store. Whatever fetches observations
//! implements [`ObservationSource`] and hands over already-materialised
//! records, pre-filtered to the run's location and outer date bound.

use std::collections::{BTreeMap, BTreeSet};

use cohort_model::{EvaluationParams, LocationId, ObservationRecord, SubjectId};
use serde::{Deserialize, Serialize};

/// Supplies raw observation records for one subject.
pub trait ObservationSource: Send + Sync {
    /// Records for `subject` within the run's location, up to `on_or_before`.
    /// History before `on_or_after` must still be returned. Unknown subjects
    /// yield no records.
    fn fetch(&self, subject: &SubjectId, params: &EvaluationParams) -> Vec<ObservationRecord>;
}

/// Records held for one subject by [`InMemorySource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectEntry {
    /// Facility the subject is registered at; `None` matches any location.
    #[serde(default)]
    pub location: Option<LocationId>,
    #[serde(default)]
    pub records: Vec<ObservationRecord>,
}

/// Source backed by a map held in memory.
///
/// Applies the same outer filters the query layer would: subjects registered
/// elsewhere yield nothing, and records whose encounter falls after
/// `on_or_before` are dropped. `on_or_after` is left to the rules that use
/// it, since most rules look back before the reporting period. Records
/// without an encounter date are always kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemorySource {
    subjects: BTreeMap<SubjectId, SubjectEntry>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(mut self, subject: SubjectId, records: Vec<ObservationRecord>) -> Self {
        self.insert(subject, records);
        self
    }

    /// Append `records` to `subject`'s entry.
    pub fn insert(&mut self, subject: SubjectId, records: Vec<ObservationRecord>) {
        self.subjects
            .entry(subject)
            .or_default()
            .records
            .extend(records);
    }

    pub fn set_location(&mut self, subject: &SubjectId, location: LocationId) {
        if let Some(entry) = self.subjects.get_mut(subject) {
            entry.location = Some(location);
        }
    }

    pub fn remove(&mut self, subject: &SubjectId) -> Option<SubjectEntry> {
        self.subjects.remove(subject)
    }

    /// Every subject this source knows about.
    pub fn cohort(&self) -> BTreeSet<SubjectId> {
        self.subjects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl ObservationSource for InMemorySource {
    fn fetch(&self, subject: &SubjectId, params: &EvaluationParams) -> Vec<ObservationRecord> {
        let Some(entry) = self.subjects.get(subject) else {
            return Vec::new();
        };
        if entry
            .location
            .is_some_and(|location| location != params.location)
        {
            return Vec::new();
        }
        entry
            .records
            .iter()
            .filter(|record| match record.encounter_date {
                Some(date) => params.on_or_before.is_none_or(|end| date <= end),
                None => true,
            })
            .cloned()
            .collect()
    }
}
