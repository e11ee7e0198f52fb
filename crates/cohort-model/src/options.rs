//! Parameters accepted by a batch run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::LocationId;

/// Mandatory-anchor parameter names, as reported in diagnostics.
pub const ON_OR_BEFORE: &str = "onOrBefore";
pub const ON_OR_AFTER: &str = "onOrAfter";

/// Evaluation window and switches for one batch run.
///
/// `on_or_before` is optional at the type level so that a missing anchor can
/// be reported by the rule that needs it, with the rule's name in the
/// diagnostic, instead of failing at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationParams {
    pub location: LocationId,
    #[serde(default)]
    pub on_or_after: Option<NaiveDate>,
    #[serde(default)]
    pub on_or_before: Option<NaiveDate>,
    #[serde(default)]
    pub additional_flags: BTreeMap<String, bool>,
}

impl EvaluationParams {
    pub fn new(location: LocationId) -> Self {
        Self {
            location,
            on_or_after: None,
            on_or_before: None,
            additional_flags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_on_or_before(mut self, date: NaiveDate) -> Self {
        self.on_or_before = Some(date);
        self
    }

    #[must_use]
    pub fn with_on_or_after(mut self, date: NaiveDate) -> Self {
        self.on_or_after = Some(date);
        self
    }

    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.additional_flags.insert(name.into(), value);
        self
    }

    /// Value of flag `name`, or `default` when it was not supplied.
    pub fn flag(&self, name: &str, default: bool) -> bool {
        self.additional_flags.get(name).copied().unwrap_or(default)
    }

    /// Whether the named parameter was supplied.
    pub fn has(&self, name: &str) -> bool {
        match name {
            ON_OR_BEFORE => self.on_or_before.is_some(),
            ON_OR_AFTER => self.on_or_after.is_some(),
            _ => self.additional_flags.contains_key(name),
        }
    }
}

/// Parse a complete `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ModelError::InvalidDate(value.to_string()))
}
