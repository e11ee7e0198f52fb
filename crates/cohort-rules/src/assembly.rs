//! Turns raw records into validated, grouped candidate sets.

use std::collections::BTreeMap;

use cohort_model::{
    CandidateSet, ConceptDictionary, FactRole, InstrumentTag, ModelError, Observation,
    ObservationRecord, SubjectId, SubjectObservations,
};
use serde::Serialize;
use tracing::{debug, warn};

/// What happened to the records offered for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub accepted: usize,
    /// Records carrying no value. These are ordinary absences, not faults.
    pub skipped: usize,
    /// Records that failed validation against the dictionary.
    pub rejected: usize,
}

impl AssemblyReport {
    pub fn merge(&mut self, other: AssemblyReport) {
        self.accepted += other.accepted;
        self.skipped += other.skipped;
        self.rejected += other.rejected;
    }
}

/// Validate `records` for `subject` and group them by role and instrument.
///
/// Invalid records never abort assembly: each is logged and counted, and the
/// remaining records are still usable.
pub fn assemble(
    subject: &SubjectId,
    records: &[ObservationRecord],
    dictionary: &dyn ConceptDictionary,
) -> (SubjectObservations, AssemblyReport) {
    let mut report = AssemblyReport::default();
    let mut grouped: BTreeMap<(FactRole, InstrumentTag), Vec<Observation>> = BTreeMap::new();

    for record in records {
        match Observation::from_record(subject.clone(), record, dictionary) {
            Ok(observation) => {
                report.accepted += 1;
                grouped
                    .entry((record.role, record.instrument))
                    .or_default()
                    .push(observation);
            }
            Err(ModelError::MissingValue { concept }) => {
                report.skipped += 1;
                debug!(
                    subject = %subject,
                    %concept,
                    instrument = %record.instrument,
                    "record without value skipped"
                );
            }
            Err(error) => {
                report.rejected += 1;
                warn!(
                    subject = %subject,
                    concept = %record.concept,
                    instrument = %record.instrument,
                    role = %record.role,
                    %error,
                    "record rejected"
                );
            }
        }
    }

    let mut observations = SubjectObservations::new(subject.clone());
    for ((role, instrument), members) in grouped {
        observations.insert(CandidateSet::new(role, instrument, members));
    }
    (observations, report)
}
