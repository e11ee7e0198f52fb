//! Value types for cohort classification.
//!
//! - **observation**: validated, immutable observations and candidate sets
//! - **enums**: instruments (with their precedence), fact roles, coded answers, labels
//! - **window**: reference windows and calendar-aware date shifting
//! - **result**: classification results and closed label sets
//! - **dictionary**: the metadata collaborator boundary
//! - **options**: batch-run parameters

pub mod dictionary;
pub mod enums;
pub mod error;
pub mod ids;
pub mod observation;
pub mod options;
pub mod result;
pub mod window;

pub use dictionary::{ConceptDictionary, InMemoryDictionary};
pub use enums::{CodedAnswer, DispensationMode, FactRole, InstrumentTag, KeyPopulation, ValueKind};
pub use error::{ModelError, Result};
pub use ids::{ConceptId, EncounterId, LocationId, SubjectId};
pub use observation::{
    CandidateSet, Observation, ObservationRecord, ObservationValue, SubjectObservations,
    TimestampBasis,
};
pub use options::{EvaluationParams, ON_OR_AFTER, ON_OR_BEFORE, parse_date};
pub use result::{ClassificationResult, CohortLabel};
pub use window::{Offset, ReferenceWindow, shift};
