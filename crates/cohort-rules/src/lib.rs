//! Cohort rules and their batch evaluation.
//!
//! - **rule**: the [`ClassificationRule`] trait, [`RuleContext`] and the
//!   [`RuleRegistry`]
//! - **rules**: the shipped rules
//! - **assembly**: raw records to validated candidate sets
//! - **source**: the extraction collaborator boundary
//! - **settings**: rule thresholds, loadable from TOML
//! - **evaluator**: parallel evaluation over a cohort

pub mod assembly;
pub mod error;
pub mod evaluator;
pub mod rule;
pub mod rules;
pub mod settings;
pub mod source;

pub use assembly::{AssemblyReport, assemble};
pub use error::{EvaluationError, Result};
pub use evaluator::{BatchEvaluator, CohortResults};
pub use rule::{
    ClassificationRule, OutputKind, RuleContext, RuleRegistry, RuleState, check_parameters,
    default_registry,
};
pub use settings::{
    DispensationModeSettings, DispensationThreshold, EstablishedOnTherapySettings,
    LostToFollowUpSettings, RuleSettings, TherapyCompletionSettings,
};
pub use source::{InMemorySource, ObservationSource, SubjectEntry};
