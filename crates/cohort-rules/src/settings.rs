//! Rule thresholds.
//!
//! Every constant a rule compares against lives here so it can be tuned per
//! deployment from a TOML file. Missing keys keep their defaults; unknown
//! keys are rejected.
//!
//! ```toml
//! [therapy_completion]
//! min_days = 173
//! max_days = 365
//!
//! [therapy_completion.monthly]
//! count = 6
//! window_months = 7
//!
//! [lost_to_follow_up]
//! grace_days = 28
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// "At least `count` dispensations within `window_months` of the start".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispensationThreshold {
    pub count: usize,
    pub window_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TherapyCompletionSettings {
    /// Earliest admissible completion, in days after the start.
    pub min_days: i64,
    /// Latest admissible completion, in days after the start.
    pub max_days: i64,
    pub monthly: DispensationThreshold,
    pub quarterly: DispensationThreshold,
}

impl Default for TherapyCompletionSettings {
    fn default() -> Self {
        Self {
            min_days: 173,
            max_days: 365,
            monthly: DispensationThreshold {
                count: 6,
                window_months: 7,
            },
            quarterly: DispensationThreshold {
                count: 2,
                window_months: 5,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LostToFollowUpSettings {
    /// Days past the scheduled return date before a subject counts as lost.
    pub grace_days: i64,
    /// Days of supply assumed for a pick-up without a recorded return date.
    pub pickup_supply_days: i32,
}

impl Default for LostToFollowUpSettings {
    fn default() -> Self {
        Self {
            grace_days: 28,
            pickup_supply_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstablishedOnTherapySettings {
    pub threshold_months: u32,
}

impl Default for EstablishedOnTherapySettings {
    fn default() -> Self {
        Self {
            threshold_months: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispensationModeSettings {
    /// How far back from the reporting date a dispensation type is accepted.
    pub lookback_months: i32,
}

impl Default for DispensationModeSettings {
    fn default() -> Self {
        Self {
            lookback_months: 12,
        }
    }
}

/// Thresholds for every shipped rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSettings {
    pub therapy_completion: TherapyCompletionSettings,
    pub lost_to_follow_up: LostToFollowUpSettings,
    pub established_on_therapy: EstablishedOnTherapySettings,
    pub dispensation_mode: DispensationModeSettings,
}

impl RuleSettings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EvaluationError::Settings`] on malformed TOML or
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
