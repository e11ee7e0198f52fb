//! Observation value objects and the per-subject collections built from them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dictionary::ConceptDictionary;
use crate::enums::{FactRole, InstrumentTag, ValueKind};
use crate::error::{ModelError, Result};
use crate::ids::{ConceptId, EncounterId, SubjectId};

/// Value carried by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ObservationValue {
    Coded(ConceptId),
    Numeric(f64),
    Date(NaiveDate),
}

impl ObservationValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ObservationValue::Coded(_) => ValueKind::Coded,
            ObservationValue::Numeric(_) => ValueKind::Numeric,
            ObservationValue::Date(_) => ValueKind::Date,
        }
    }

    pub fn as_coded(&self) -> Option<ConceptId> {
        match self {
            ObservationValue::Coded(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ObservationValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ObservationValue::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    /// Total order across values, used only to make tie-breaks deterministic.
    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ObservationValue::Coded(a), ObservationValue::Coded(b)) => a.cmp(b),
            (ObservationValue::Numeric(a), ObservationValue::Numeric(b)) => a.total_cmp(b),
            (ObservationValue::Date(a), ObservationValue::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ObservationValue::Coded(_) => 0,
            ObservationValue::Numeric(_) => 1,
            ObservationValue::Date(_) => 2,
        }
    }
}

/// Which date an observation's timestamp is taken from.
///
/// Date-valued facts (a recorded start date, a scheduled return date) are
/// timed by their own value; coded and numeric facts are timed by the
/// encounter that recorded them. Choosing the wrong basis shifts every
/// window computed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampBasis {
    ValueDate,
    #[default]
    EncounterDate,
}

/// An observation as delivered by the extraction collaborator, before
/// validation against the metadata dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub role: FactRole,
    pub instrument: InstrumentTag,
    pub concept: ConceptId,
    #[serde(default)]
    pub value: Option<ObservationValue>,
    #[serde(default)]
    pub basis: TimestampBasis,
    #[serde(default)]
    pub encounter_date: Option<NaiveDate>,
    #[serde(default)]
    pub encounter_id: Option<EncounterId>,
}

impl ObservationRecord {
    /// Coded fact timed by its encounter.
    pub fn coded(
        role: FactRole,
        instrument: InstrumentTag,
        concept: ConceptId,
        answer: ConceptId,
        encounter_date: NaiveDate,
    ) -> Self {
        Self {
            role,
            instrument,
            concept,
            value: Some(ObservationValue::Coded(answer)),
            basis: TimestampBasis::EncounterDate,
            encounter_date: Some(encounter_date),
            encounter_id: None,
        }
    }

    /// Date-valued fact timed by its own value.
    pub fn date(
        role: FactRole,
        instrument: InstrumentTag,
        concept: ConceptId,
        value: NaiveDate,
    ) -> Self {
        Self {
            role,
            instrument,
            concept,
            value: Some(ObservationValue::Date(value)),
            basis: TimestampBasis::ValueDate,
            encounter_date: None,
            encounter_id: None,
        }
    }

    /// Numeric fact timed by its encounter.
    pub fn numeric(
        role: FactRole,
        instrument: InstrumentTag,
        concept: ConceptId,
        value: f64,
        encounter_date: NaiveDate,
    ) -> Self {
        Self {
            role,
            instrument,
            concept,
            value: Some(ObservationValue::Numeric(value)),
            basis: TimestampBasis::EncounterDate,
            encounter_date: Some(encounter_date),
            encounter_id: None,
        }
    }

    #[must_use]
    pub fn with_encounter(mut self, id: EncounterId, date: NaiveDate) -> Self {
        self.encounter_id = Some(id);
        self.encounter_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_encounter_id(mut self, id: EncounterId) -> Self {
        self.encounter_id = Some(id);
        self
    }
}

/// One timestamped fact about a subject, attributable to one instrument.
///
/// Fields are private: an `Observation` can only be obtained through
/// validation and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    subject: SubjectId,
    concept: ConceptId,
    value: ObservationValue,
    basis: TimestampBasis,
    timestamp: NaiveDate,
    encounter_date: Option<NaiveDate>,
    encounter_id: Option<EncounterId>,
    instrument: InstrumentTag,
}

impl Observation {
    /// Validate `record` against the concept's declared value kind.
    ///
    /// # Errors
    ///
    /// - [`ModelError::MissingValue`] when the record carries no value.
    /// - [`ModelError::MalformedObservation`] when the value kind differs from
    ///   `declared`, or a value-date basis is used on a non-date value.
    /// - [`ModelError::MissingTimestamp`] when the basis is the encounter date
    ///   and the record has none.
    pub fn try_new(
        subject: SubjectId,
        record: &ObservationRecord,
        declared: ValueKind,
    ) -> Result<Self> {
        let value = record.value.ok_or(ModelError::MissingValue {
            concept: record.concept,
        })?;
        if value.kind() != declared {
            return Err(ModelError::MalformedObservation {
                concept: record.concept,
                expected: declared,
                found: value.kind(),
            });
        }
        let timestamp = match record.basis {
            TimestampBasis::ValueDate => {
                value.as_date().ok_or(ModelError::MalformedObservation {
                    concept: record.concept,
                    expected: ValueKind::Date,
                    found: value.kind(),
                })?
            }
            TimestampBasis::EncounterDate => {
                record.encounter_date.ok_or(ModelError::MissingTimestamp {
                    concept: record.concept,
                })?
            }
        };
        Ok(Self {
            subject,
            concept: record.concept,
            value,
            basis: record.basis,
            timestamp,
            encounter_date: record.encounter_date,
            encounter_id: record.encounter_id,
            instrument: record.instrument,
        })
    }

    /// Validate `record` using the dictionary's declaration for its concept.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnknownConcept`] when the dictionary does not declare the
    /// concept, otherwise as [`Observation::try_new`].
    pub fn from_record(
        subject: SubjectId,
        record: &ObservationRecord,
        dictionary: &dyn ConceptDictionary,
    ) -> Result<Self> {
        let declared = dictionary
            .value_kind(record.concept)
            .ok_or(ModelError::UnknownConcept(record.concept))?;
        Self::try_new(subject, record, declared)
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    pub fn value(&self) -> &ObservationValue {
        &self.value
    }

    pub fn basis(&self) -> TimestampBasis {
        self.basis
    }

    /// Effective date of the fact.
    pub fn timestamp(&self) -> NaiveDate {
        self.timestamp
    }

    pub fn encounter_date(&self) -> Option<NaiveDate> {
        self.encounter_date
    }

    pub fn encounter_id(&self) -> Option<EncounterId> {
        self.encounter_id
    }

    pub fn instrument(&self) -> InstrumentTag {
        self.instrument
    }

    /// Order on everything except the timestamp: instrument precedence,
    /// then the later recording visit, then encounter id, concept and value.
    /// Two observations comparing equal here and sharing a timestamp are
    /// interchangeable for every rule.
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        self.instrument
            .precedence()
            .cmp(&other.instrument.precedence())
            .then_with(|| other.encounter_date.cmp(&self.encounter_date))
            .then_with(|| self.encounter_id.cmp(&other.encounter_id))
            .then_with(|| self.concept.cmp(&other.concept))
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Observations of one semantic fact for one subject from one instrument,
/// ordered by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    role: FactRole,
    instrument: InstrumentTag,
    observations: Vec<Observation>,
}

impl CandidateSet {
    pub fn new(role: FactRole, instrument: InstrumentTag, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(Observation::timestamp);
        Self {
            role,
            instrument,
            observations,
        }
    }

    pub fn role(&self) -> FactRole {
        self.role
    }

    pub fn instrument(&self) -> InstrumentTag {
        self.instrument
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// A copy of this set keeping only observations matching `predicate`.
    #[must_use]
    pub fn filtered(&self, predicate: impl Fn(&Observation) -> bool) -> CandidateSet {
        CandidateSet {
            role: self.role,
            instrument: self.instrument,
            observations: self
                .observations
                .iter()
                .filter(|observation| predicate(observation))
                .cloned()
                .collect(),
        }
    }

    /// Whether any observation in this set was recorded during `encounter`.
    pub fn contains_encounter(&self, encounter: EncounterId) -> bool {
        self.observations
            .iter()
            .any(|observation| observation.encounter_id() == Some(encounter))
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// All candidate sets for one subject, keyed by role and instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectObservations {
    subject: SubjectId,
    sets: BTreeMap<(FactRole, InstrumentTag), CandidateSet>,
}

impl SubjectObservations {
    pub fn new(subject: SubjectId) -> Self {
        Self {
            subject,
            sets: BTreeMap::new(),
        }
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// Add a candidate set, merging with an existing set for the same role
    /// and instrument.
    pub fn insert(&mut self, set: CandidateSet) {
        let key = (set.role(), set.instrument());
        match self.sets.remove(&key) {
            Some(existing) => {
                let mut merged = existing.observations;
                merged.extend(set.observations);
                self.sets
                    .insert(key, CandidateSet::new(key.0, key.1, merged));
            }
            None => {
                self.sets.insert(key, set);
            }
        }
    }

    pub fn set(&self, role: FactRole, instrument: InstrumentTag) -> Option<&CandidateSet> {
        self.sets.get(&(role, instrument))
    }

    /// Candidate sets for `role`, in instrument precedence order.
    pub fn sets(&self, role: FactRole) -> impl Iterator<Item = &CandidateSet> {
        self.sets
            .range((role, InstrumentTag::AdultFollowUp)..=(role, InstrumentTag::PersonAttribute))
            .map(|(_, set)| set)
    }

    /// Every observation for `role` across instruments.
    pub fn observations(&self, role: FactRole) -> impl Iterator<Item = &Observation> {
        self.sets(role).flat_map(CandidateSet::iter)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.sets.values().map(CandidateSet::len).sum()
    }
}
