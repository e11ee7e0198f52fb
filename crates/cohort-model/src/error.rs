use thiserror::Error;

use crate::enums::ValueKind;
use crate::ids::ConceptId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid subject id: {0:?}")]
    InvalidSubjectId(String),
    #[error("concept {0} is not declared in the metadata dictionary")]
    UnknownConcept(ConceptId),
    #[error("malformed observation for concept {concept}: expected a {expected} value, found {found}")]
    MalformedObservation {
        concept: ConceptId,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("observation for concept {concept} carries no value")]
    MissingValue { concept: ConceptId },
    #[error("observation for concept {concept} has no encounter date to take its timestamp from")]
    MissingTimestamp { concept: ConceptId },
    #[error("unknown cohort label: {0}")]
    UnknownLabel(String),
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
