use cohort_core::resolve_latest;
use cohort_model::{ClassificationResult, FactRole, SubjectObservations};

use super::common::answer_of;
use crate::rule::{ClassificationRule, OutputKind, RuleContext};

/// Most recently reported key population group.
///
/// Answers outside the closed key population set are ignored rather than
/// treated as a group.
pub struct KeyPopulationRule;

impl ClassificationRule for KeyPopulationRule {
    fn id(&self) -> &'static str {
        "key-population"
    }

    fn description(&self) -> &'static str {
        "Latest reported key population group"
    }

    fn output(&self) -> OutputKind {
        OutputKind::Label
    }

    fn classify(
        &self,
        observations: &SubjectObservations,
        context: &RuleContext<'_>,
    ) -> Option<ClassificationResult> {
        let until = context.params.on_or_before?;
        let dictionary = context.dictionary;
        let chosen = resolve_latest(
            observations
                .observations(FactRole::KeyPopulation)
                .filter(|observation| observation.timestamp() <= until)
                .filter(|observation| {
                    answer_of(observation, dictionary).is_some_and(|a| a.key_population().is_some())
                }),
        )?;
        answer_of(chosen, dictionary)
            .and_then(|answer| answer.key_population())
            .map(ClassificationResult::from)
    }
}
