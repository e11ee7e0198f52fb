use chrono::NaiveDate;
use cohort_core::{days_between, resolve_latest};
use cohort_model::{ClassificationResult, FactRole, Offset, SubjectObservations, shift};
use tracing::debug;

use crate::rule::{ClassificationRule, RuleContext};
use crate::settings::LostToFollowUpSettings;

/// Subjects who missed their scheduled return by more than the grace period.
///
/// The scheduled return is the later of two estimates: the latest
/// consultation or pick-up appointment (resolved across instruments), and
/// the most recent drug pick-up plus the assumed supply. Appointments timed
/// by their visit resolve to the one recorded at the most recent visit;
/// appointments timed by their own value resolve to the latest scheduled
/// date. Only visits on or before the reporting date count; the scheduled
/// date itself may lie after it.
pub struct LostToFollowUp;

impl ClassificationRule for LostToFollowUp {
    fn id(&self) -> &'static str {
        "lost-to-follow-up"
    }

    fn description(&self) -> &'static str {
        "Missed the scheduled return by more than the grace period"
    }

    fn classify(
        &self,
        observations: &SubjectObservations,
        context: &RuleContext<'_>,
    ) -> Option<ClassificationResult> {
        let until = context.params.on_or_before?;
        let settings = &context.settings.lost_to_follow_up;
        let scheduled = scheduled_return(observations, until, settings)?;
        let lost = is_lost(scheduled, until, settings);
        debug!(
            subject = %observations.subject(),
            %scheduled,
            lost,
            "scheduled return evaluated"
        );
        Some(ClassificationResult::Flag(lost))
    }
}

/// Expected return date as of `until`, or `None` when nothing schedules one.
pub fn scheduled_return(
    observations: &SubjectObservations,
    until: NaiveDate,
    settings: &LostToFollowUpSettings,
) -> Option<NaiveDate> {
    let appointment = resolve_latest(
        observations
            .observations(FactRole::NextConsultationDate)
            .chain(observations.observations(FactRole::NextPickupDate))
            .filter(|observation| observation.encounter_date().is_none_or(|date| date <= until)),
    )
    .and_then(|observation| observation.value().as_date());

    let supply_end = resolve_latest(
        observations
            .observations(FactRole::DrugPickup)
            .filter(|observation| observation.timestamp() <= until),
    )
    .and_then(|pickup| shift(pickup.timestamp(), Offset::Days(settings.pickup_supply_days)));

    appointment.max(supply_end)
}

/// Whether `until` is more than the grace period past `scheduled`.
pub fn is_lost(scheduled: NaiveDate, until: NaiveDate, settings: &LostToFollowUpSettings) -> bool {
    days_between(scheduled, until) > settings.grace_days
}
