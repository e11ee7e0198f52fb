//! Batch evaluation over a cohort.
//!
//! Subjects are independent, so each is fetched, assembled and classified
//! on a rayon worker and the per-subject outcomes are folded into one
//! ordered map afterwards. Nothing is shared mutably between workers.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use cohort_model::{
    ClassificationResult, CohortLabel, ConceptDictionary, EvaluationParams, SubjectId,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::assembly::{AssemblyReport, assemble};
use crate::error::{EvaluationError, Result};
use crate::rule::{ClassificationRule, RuleContext, RuleRegistry, RuleState, check_parameters};
use crate::settings::RuleSettings;
use crate::source::ObservationSource;

/// Outcome of one rule over one cohort.
///
/// Subjects whose result was undetermined have no entry in `results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortResults {
    rule: String,
    results: BTreeMap<SubjectId, ClassificationResult>,
    evaluated: usize,
    observations: AssemblyReport,
}

impl CohortResults {
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn results(&self) -> &BTreeMap<SubjectId, ClassificationResult> {
        &self.results
    }

    pub fn into_results(self) -> BTreeMap<SubjectId, ClassificationResult> {
        self.results
    }

    pub fn get(&self, subject: &SubjectId) -> Option<ClassificationResult> {
        self.results.get(subject).copied()
    }

    /// Subjects the rule ran for, determined or not.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn positive_count(&self) -> usize {
        self.count_flags(true)
    }

    pub fn negative_count(&self) -> usize {
        self.count_flags(false)
    }

    pub fn undetermined_count(&self) -> usize {
        self.evaluated - self.results.len()
    }

    /// Subjects per label, for label rules.
    pub fn label_counts(&self) -> BTreeMap<CohortLabel, usize> {
        let mut counts = BTreeMap::new();
        for label in self.results.values().filter_map(ClassificationResult::as_label) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    pub fn labelled_count(&self) -> usize {
        self.label_counts().values().sum()
    }

    pub fn observations(&self) -> AssemblyReport {
        self.observations
    }

    pub fn rejected_observations(&self) -> usize {
        self.observations.rejected
    }

    fn count_flags(&self, expected: bool) -> usize {
        self.results
            .values()
            .filter(|result| result.as_flag() == Some(expected))
            .count()
    }
}

/// One subject's results for a list of rules, in rule order.
struct SubjectOutcome {
    subject: SubjectId,
    results: Vec<Option<ClassificationResult>>,
    report: AssemblyReport,
}

/// Runs registered rules over a cohort with injected collaborators.
pub struct BatchEvaluator<'a> {
    registry: &'a RuleRegistry,
    dictionary: &'a dyn ConceptDictionary,
    source: &'a dyn ObservationSource,
    settings: &'a RuleSettings,
}

impl<'a> BatchEvaluator<'a> {
    pub fn new(
        registry: &'a RuleRegistry,
        dictionary: &'a dyn ConceptDictionary,
        source: &'a dyn ObservationSource,
        settings: &'a RuleSettings,
    ) -> Self {
        Self {
            registry,
            dictionary,
            source,
            settings,
        }
    }

    /// Evaluate one rule for every subject in `cohort`.
    ///
    /// # Errors
    ///
    /// - [`crate::EvaluationError::UnknownRule`] / [`crate::EvaluationError::DisabledRule`]
    ///   when `rule_id` cannot be run.
    /// - [`crate::EvaluationError::MissingMandatoryParameter`] before any
    ///   subject is touched.
    pub fn evaluate(
        &self,
        cohort: &BTreeSet<SubjectId>,
        rule_id: &str,
        params: &EvaluationParams,
    ) -> Result<CohortResults> {
        let rule = self.registry.require(rule_id)?;
        check_parameters(rule, params)?;
        self.run(cohort, &[rule], params)
            .pop()
            .ok_or_else(|| EvaluationError::UnknownRule(rule_id.to_string()))
    }

    /// Evaluate every enabled rule, fetching each subject's records once.
    ///
    /// # Errors
    ///
    /// Fails on the first rule whose mandatory parameters are missing.
    pub fn evaluate_all(
        &self,
        cohort: &BTreeSet<SubjectId>,
        params: &EvaluationParams,
    ) -> Result<Vec<CohortResults>> {
        let rules: Vec<&dyn ClassificationRule> = self.registry.enabled().collect();
        for rule in &rules {
            check_parameters(*rule, params)?;
        }
        Ok(self.run(cohort, &rules, params))
    }

    fn run(
        &self,
        cohort: &BTreeSet<SubjectId>,
        rules: &[&dyn ClassificationRule],
        params: &EvaluationParams,
    ) -> Vec<CohortResults> {
        let ids: Vec<&str> = rules.iter().map(|rule| rule.id()).collect();
        let span = info_span!("evaluate", rules = ?ids, subjects = cohort.len());
        let _guard = span.enter();
        let start = Instant::now();
        let context = RuleContext::new(params, self.dictionary, self.settings);

        let outcomes: Vec<SubjectOutcome> = cohort
            .par_iter()
            .map(|subject| self.classify_subject(subject, rules, &context))
            .collect();

        let mut collected: Vec<CohortResults> = rules
            .iter()
            .map(|rule| CohortResults {
                rule: rule.id().to_string(),
                results: BTreeMap::new(),
                evaluated: outcomes.len(),
                observations: AssemblyReport::default(),
            })
            .collect();
        for outcome in outcomes {
            for (slot, result) in collected.iter_mut().zip(outcome.results) {
                slot.observations.merge(outcome.report);
                if let Some(result) = result {
                    slot.results.insert(outcome.subject.clone(), result);
                }
            }
        }

        for results in &collected {
            info!(
                rule = results.rule(),
                evaluated = results.evaluated(),
                determined = results.results().len(),
                rejected_observations = results.rejected_observations(),
                duration_ms = start.elapsed().as_millis(),
                "rule evaluation complete"
            );
        }
        collected
    }

    fn classify_subject(
        &self,
        subject: &SubjectId,
        rules: &[&dyn ClassificationRule],
        context: &RuleContext<'_>,
    ) -> SubjectOutcome {
        let records = self.source.fetch(subject, context.params);
        let (observations, report) = assemble(subject, &records, self.dictionary);
        let results = rules
            .iter()
            .map(|rule| {
                debug!(rule = rule.id(), subject = %subject, state = ?RuleState::Pending);
                let result = rule.classify(&observations, context);
                debug!(
                    rule = rule.id(),
                    subject = %subject,
                    state = ?RuleState::Evaluated,
                    determined = result.is_some(),
                    "subject classified"
                );
                result
            })
            .collect();
        SubjectOutcome {
            subject: subject.clone(),
            results,
            report,
        }
    }
}
