//! Classification results handed to the aggregation layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::{DispensationMode, KeyPopulation};
use crate::error::ModelError;

/// Nominal label drawn from a closed enumeration.
///
/// Labels serialise as their report code (`"MSM"`, `"QUARTERLY"`, ...).
/// Codes are unique across every label family, so parsing is unambiguous and
/// anything unrecognised is rejected with [`ModelError::UnknownLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CohortLabel {
    KeyPopulation(KeyPopulation),
    Dispensation(DispensationMode),
}

impl CohortLabel {
    pub fn code(&self) -> &'static str {
        match self {
            CohortLabel::KeyPopulation(population) => population.code(),
            CohortLabel::Dispensation(mode) => mode.code(),
        }
    }
}

impl fmt::Display for CohortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CohortLabel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let population = KeyPopulation::ALL
            .into_iter()
            .find(|population| population.code() == normalized)
            .map(CohortLabel::KeyPopulation);
        let mode = || {
            DispensationMode::ALL
                .into_iter()
                .find(|mode| mode.code() == normalized)
                .map(CohortLabel::Dispensation)
        };
        population
            .or_else(mode)
            .ok_or_else(|| ModelError::UnknownLabel(s.to_string()))
    }
}

impl TryFrom<String> for CohortLabel {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CohortLabel> for String {
    fn from(value: CohortLabel) -> Self {
        value.code().to_string()
    }
}

/// Outcome of one rule for one subject.
///
/// There is no "unknown" variant: an undetermined outcome is the absence of
/// a result, which keeps it distinct from `Flag(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationResult {
    Flag(bool),
    Label(CohortLabel),
}

impl ClassificationResult {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ClassificationResult::Flag(value) => Some(*value),
            ClassificationResult::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<CohortLabel> {
        match self {
            ClassificationResult::Label(label) => Some(*label),
            ClassificationResult::Flag(_) => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, ClassificationResult::Flag(true))
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationResult::Flag(true) => f.write_str("yes"),
            ClassificationResult::Flag(false) => f.write_str("no"),
            ClassificationResult::Label(label) => write!(f, "{label}"),
        }
    }
}

impl From<bool> for ClassificationResult {
    fn from(value: bool) -> Self {
        ClassificationResult::Flag(value)
    }
}

impl From<KeyPopulation> for ClassificationResult {
    fn from(value: KeyPopulation) -> Self {
        ClassificationResult::Label(CohortLabel::KeyPopulation(value))
    }
}

impl From<DispensationMode> for ClassificationResult {
    fn from(value: DispensationMode) -> Self {
        ClassificationResult::Label(CohortLabel::Dispensation(value))
    }
}
