use chrono::NaiveDate;
use cohort_core::is_beyond_threshold;
use cohort_model::{ClassificationResult, CodedAnswer, FactRole, SubjectObservations};
use tracing::debug;

use super::common::event_dates;
use crate::rule::{ClassificationRule, RuleContext};

/// Subjects on antiretroviral therapy for longer than the threshold.
pub struct EstablishedOnTherapy;

impl ClassificationRule for EstablishedOnTherapy {
    fn id(&self) -> &'static str {
        "established-on-therapy"
    }

    fn description(&self) -> &'static str {
        "On antiretroviral therapy for more than the threshold months"
    }

    fn classify(
        &self,
        observations: &SubjectObservations,
        context: &RuleContext<'_>,
    ) -> Option<ClassificationResult> {
        let until = context.params.on_or_before?;
        let threshold = context.settings.established_on_therapy.threshold_months;
        let starts = event_dates(
            observations,
            context.dictionary,
            FactRole::ArtStart,
            CodedAnswer::Start,
            FactRole::ArtStartDate,
            until,
        );
        if starts.is_empty() {
            return None;
        }
        let established = any_beyond(&starts, until, threshold);
        debug!(
            subject = %observations.subject(),
            starts = starts.len(),
            established,
            "therapy duration evaluated"
        );
        Some(ClassificationResult::Flag(established))
    }
}

fn any_beyond(starts: &[NaiveDate], until: NaiveDate, threshold_months: u32) -> bool {
    starts
        .iter()
        .any(|start| is_beyond_threshold(*start, until, threshold_months))
}
