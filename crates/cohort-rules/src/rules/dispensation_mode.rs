use cohort_core::resolve_between;
use cohort_model::{ClassificationResult, FactRole, ReferenceWindow, SubjectObservations};

use super::common::answer_of;
use crate::rule::{ClassificationRule, OutputKind, RuleContext};

/// Dispensation mode recorded most recently within the lookback period.
///
/// The period ends at `onOrBefore` and reaches back the configured number of
/// months, or only to `onOrAfter` when that is later.
pub struct DispensationModeRule;

impl ClassificationRule for DispensationModeRule {
    fn id(&self) -> &'static str {
        "dispensation-mode"
    }

    fn description(&self) -> &'static str {
        "Latest dispensation mode within the lookback period"
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
        let lookback = context.settings.dispensation_mode.lookback_months;
        let window = ReferenceWindow::months_before(until, lookback);
        let (start, end) = match context.params.on_or_after {
            Some(floor) => window.clamp_start(floor)?,
            None => window.bounds()?,
        };
        let dictionary = context.dictionary;
        let chosen = resolve_between(
            observations
                .observations(FactRole::DispensationType)
                .filter(|observation| {
                    answer_of(observation, dictionary)
                        .is_some_and(|answer| answer.dispensation_mode().is_some())
                }),
            start,
            end,
        )?;
        answer_of(chosen, dictionary)
            .and_then(|answer| answer.dispensation_mode())
            .map(ClassificationResult::from)
    }
}
