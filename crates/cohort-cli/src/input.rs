//! Cohort input files.
//!
//! ```json
//! {
//!   "dictionary": {
//!     "concepts": [{ "id": 1000, "kind": "coded" }],
//!     "answers": [{ "id": 1256, "answer": "start" }]
//!   },
//!   "subjects": {
//!     "P-1": {
//!       "location": 1,
//!       "records": [
//!         { "role": "therapy_start", "instrument": "adult_follow_up", "concept": 1000,
//!           "value": { "kind": "coded", "value": 1256 }, "encounter_date": "2024-01-10" }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cohort_model::InMemoryDictionary;
use cohort_rules::{InMemorySource, RuleSettings};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CohortInput {
    pub dictionary: InMemoryDictionary,
    pub subjects: InMemorySource,
}

impl CohortInput {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse cohort input")
    }
}

pub fn load_input(path: &Path) -> Result<CohortInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read cohort input {}", path.display()))?;
    CohortInput::from_json_str(&text).with_context(|| format!("in {}", path.display()))
}

/// Rule settings from `path`, or the defaults when none is given.
pub fn load_settings(path: Option<&Path>) -> Result<RuleSettings> {
    let Some(path) = path else {
        return Ok(RuleSettings::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read rule settings {}", path.display()))?;
    RuleSettings::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
}
