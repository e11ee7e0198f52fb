use chrono::NaiveDate;
use cohort_core::{in_range, reaches};
use cohort_model::{
    ClassificationResult, CodedAnswer, ConceptDictionary, FactRole, InstrumentTag,
    SubjectObservations,
};
use tracing::debug;

use super::common::{event_dates, has_answer};
use crate::rule::{ClassificationRule, RuleContext};
use crate::settings::{DispensationThreshold, TherapyCompletionSettings};

/// Flag that turns the dispensation evidence off when set to `false`.
pub const COUNT_DISPENSATIONS: &str = "countDispensations";

/// Subjects who completed a preventive therapy course.
///
/// A start is any `Start` answer or recorded start date. The course counts
/// as completed when a completion answer or end date falls within the
/// admissible day range after that start, or when enough dispensations were
/// picked up within the month window after it.
pub struct TherapyCompletion;

impl ClassificationRule for TherapyCompletion {
    fn id(&self) -> &'static str {
        "therapy-completion"
    }

    fn description(&self) -> &'static str {
        "Completed preventive therapy within the admissible period"
    }

    fn classify(
        &self,
        observations: &SubjectObservations,
        context: &RuleContext<'_>,
    ) -> Option<ClassificationResult> {
        let until = context.params.on_or_before?;
        let settings = &context.settings.therapy_completion;
        let starts = event_dates(
            observations,
            context.dictionary,
            FactRole::TherapyStart,
            CodedAnswer::Start,
            FactRole::TherapyStartDate,
            until,
        );
        if starts.is_empty() {
            return None;
        }
        let ends = event_dates(
            observations,
            context.dictionary,
            FactRole::TherapyEnd,
            CodedAnswer::Completed,
            FactRole::TherapyEndDate,
            until,
        );
        let count_dispensations = context.params.flag(COUNT_DISPENSATIONS, true);

        let completed = starts.iter().any(|start| {
            let by_end = completed_within(*start, &ends, settings);
            let by_dispensation = count_dispensations
                && dispensations_reach(observations, context.dictionary, *start, until, settings);
            debug!(
                subject = %observations.subject(),
                %start,
                by_end,
                by_dispensation,
                "therapy start evaluated"
            );
            by_end || by_dispensation
        });
        Some(ClassificationResult::Flag(completed))
    }
}

/// Whether any end date lies in the admissible day range after `start`.
pub fn completed_within(
    start: NaiveDate,
    ends: &[NaiveDate],
    settings: &TherapyCompletionSettings,
) -> bool {
    ends.iter()
        .any(|end| in_range(start, *end, settings.min_days, settings.max_days))
}

/// Whether monthly or quarterly dispensations after `start` reach their
/// thresholds on any one instrument.
///
/// A dispensation visit only counts for a mode when the same encounter
/// recorded that dispensation type. Visits after `until` never count.
pub fn dispensations_reach(
    observations: &SubjectObservations,
    dictionary: &dyn ConceptDictionary,
    start: NaiveDate,
    until: NaiveDate,
    settings: &TherapyCompletionSettings,
) -> bool {
    let modes = [
        (CodedAnswer::Monthly, settings.monthly),
        (CodedAnswer::Quarterly, settings.quarterly),
    ];
    InstrumentTag::ALL.iter().any(|instrument| {
        let Some(visits) = observations.set(FactRole::TherapyDispensation, *instrument) else {
            return false;
        };
        let visits =
            visits.filtered(|visit| visit.encounter_date().is_some_and(|day| day <= until));
        let Some(types) = observations.set(FactRole::DispensationType, *instrument) else {
            return false;
        };
        modes.iter().any(|(answer, threshold)| {
            let DispensationThreshold {
                count,
                window_months,
            } = *threshold;
            let of_mode = types.filtered(|observation| has_answer(observation, dictionary, *answer));
            !of_mode.is_empty() && reaches(&visits, Some(&of_mode), start, count, window_months)
        })
    })
}
