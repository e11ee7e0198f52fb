//! Classification rule trait and registry.
//!
//! Each cohort rule implements [`ClassificationRule`] as a unit struct and is
//! registered in a [`RuleRegistry`] under its id. The evaluator looks rules
//! up by id (case-insensitive) and skips disabled ones when running all.
//!
//! ```
//! use cohort_rules::default_registry;
//!
//! let registry = default_registry();
//! let rule = registry.get("Therapy-Completion").unwrap();
//! assert_eq!(rule.id(), "therapy-completion");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cohort_model::{
    ClassificationResult, ConceptDictionary, EvaluationParams, ON_OR_AFTER, ON_OR_BEFORE,
    SubjectObservations,
};

use crate::error::{EvaluationError, Result};
use crate::rules;
use crate::settings::RuleSettings;

/// Shape of a rule's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Flag,
    Label,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Flag => "flag",
            OutputKind::Label => "label",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one rule evaluation for one subject.
///
/// There is no retry: an evaluation that produced nothing stays
/// `Evaluated` with an undetermined result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Pending,
    Evaluated,
}

/// Everything a rule reads besides the subject's own observations.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub params: &'a EvaluationParams,
    pub dictionary: &'a dyn ConceptDictionary,
    pub settings: &'a RuleSettings,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        params: &'a EvaluationParams,
        dictionary: &'a dyn ConceptDictionary,
        settings: &'a RuleSettings,
    ) -> Self {
        Self {
            params,
            dictionary,
            settings,
        }
    }
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("params", self.params)
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}

/// A named cohort rule.
///
/// Rules are pure: for the same observations and context they return the
/// same result, and they never see another subject's data.
pub trait ClassificationRule: Send + Sync {
    /// Stable kebab-case identifier, e.g. `therapy-completion`.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "Cohort rule"
    }

    /// Parameters that must be present before any subject is evaluated.
    fn required_parameters(&self) -> &'static [&'static str] {
        &[ON_OR_BEFORE]
    }

    fn output(&self) -> OutputKind {
        OutputKind::Flag
    }

    /// Classify one subject. `None` means undetermined, which is distinct
    /// from a negative flag.
    fn classify(
        &self,
        observations: &SubjectObservations,
        context: &RuleContext<'_>,
    ) -> Option<ClassificationResult>;
}

/// Fail with [`EvaluationError::MissingMandatoryParameter`] when `params`
/// lacks something `rule` requires.
pub fn check_parameters(rule: &dyn ClassificationRule, params: &EvaluationParams) -> Result<()> {
    for &parameter in rule.required_parameters() {
        let present = match parameter {
            ON_OR_BEFORE => params.on_or_before.is_some(),
            ON_OR_AFTER => params.on_or_after.is_some(),
            other => params.additional_flags.contains_key(other),
        };
        if !present {
            return Err(EvaluationError::MissingMandatoryParameter {
                rule: rule.id(),
                parameter,
            });
        }
    }
    Ok(())
}

/// Rules indexed by id.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<&'static str, Box<dyn ClassificationRule>>,
    disabled: BTreeSet<&'static str>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under its id, replacing any rule with the same id.
    pub fn register(&mut self, rule: Box<dyn ClassificationRule>) {
        self.rules.insert(rule.id(), rule);
    }

    /// Look up a rule by id, ignoring case. Disabled rules are still found.
    pub fn get(&self, id: &str) -> Option<&dyn ClassificationRule> {
        let id = id.trim().to_ascii_lowercase();
        self.rules.get(id.as_str()).map(|rule| rule.as_ref())
    }

    /// Like [`RuleRegistry::get`], failing for unknown or disabled rules.
    pub fn require(&self, id: &str) -> Result<&dyn ClassificationRule> {
        let rule = self
            .get(id)
            .ok_or_else(|| EvaluationError::UnknownRule(id.to_string()))?;
        if self.is_disabled(rule.id()) {
            return Err(EvaluationError::DisabledRule(rule.id().to_string()));
        }
        Ok(rule)
    }

    /// Returns `false` when no such rule is registered.
    pub fn disable(&mut self, id: &str) -> bool {
        match self.get(id).map(|rule| rule.id()) {
            Some(key) => {
                self.disabled.insert(key);
                true
            }
            None => false,
        }
    }

    pub fn enable(&mut self, id: &str) -> bool {
        match self.get(id).map(|rule| rule.id()) {
            Some(key) => {
                self.disabled.remove(key);
                true
            }
            None => false,
        }
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.get(id)
            .is_some_and(|rule| self.disabled.contains(rule.id()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every registered id in ascending order, disabled ones included.
    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    /// Enabled rules in id order.
    pub fn enabled(&self) -> impl Iterator<Item = &dyn ClassificationRule> + '_ {
        self.rules
            .iter()
            .filter(|(id, _)| !self.disabled.contains(*id))
            .map(|(_, rule)| rule.as_ref())
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// A registry holding every shipped rule, all enabled.
pub fn default_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(Box::new(rules::TherapyCompletion));
    registry.register(Box::new(rules::LostToFollowUp));
    registry.register(Box::new(rules::EstablishedOnTherapy));
    registry.register(Box::new(rules::KeyPopulationRule));
    registry.register(Box::new(rules::DispensationModeRule));
    registry
}
