//! Source precedence resolution.
//!
//! Several instruments may independently report the same clinical fact. The
//! resolver picks the one observation that stands as "the" value:
//!
//! 1. Observations without a value never reach this module (they are
//!    rejected when records are validated), and `None` reports are skipped.
//! 2. Candidates are grouped by effective date and the latest group wins.
//! 3. Within that group the instrument with the lowest precedence ordinal
//!    wins. Because every present instrument is ranked, a missing
//!    top-precedence report falls through to the next present instrument in
//!    ordinal order.
//! 4. Remaining ties (same instrument, same date) are broken by encounter,
//!    concept and value, so the outcome never depends on input order.
//!
//! Nothing here fails: `None` means the fact is unknown, not false.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use cohort_model::{InstrumentTag, Observation, ReferenceWindow};
use tracing::trace;

/// Resolve one instrument → observation report per instrument.
///
/// ```
/// use chrono::NaiveDate;
/// use cohort_core::resolver::resolve;
/// use cohort_model::{
///     ConceptId, FactRole, InstrumentTag, Observation, ObservationRecord, SubjectId, ValueKind,
/// };
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let make = |instrument| {
///     let record = ObservationRecord::date(FactRole::NextPickupDate, instrument, ConceptId::new(5096), day);
///     Observation::try_new(SubjectId::new("P-1").unwrap(), &record, ValueKind::Date).unwrap()
/// };
/// let pickup = make(InstrumentTag::DrugPickup);
/// let follow_up = make(InstrumentTag::AdultFollowUp);
///
/// let chosen = resolve([
///     (InstrumentTag::DrugPickup, Some(&pickup)),
///     (InstrumentTag::AdultFollowUp, Some(&follow_up)),
///     (InstrumentTag::ClinicalSummary, None),
/// ]);
/// assert_eq!(chosen.map(Observation::instrument), Some(InstrumentTag::AdultFollowUp));
/// ```
pub fn resolve<'a, I>(reports: I) -> Option<&'a Observation>
where
    I: IntoIterator<Item = (InstrumentTag, Option<&'a Observation>)>,
{
    resolve_latest(reports.into_iter().filter_map(|(_, observation)| observation))
}

/// Latest observation, with same-date ties broken by instrument precedence.
pub fn resolve_latest<'a, I>(candidates: I) -> Option<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let groups = group_by_date(candidates);
    let (date, group) = groups.into_iter().next_back()?;
    pick_by_precedence(date, &group)
}

/// Earliest observation, with same-date ties broken by instrument precedence.
pub fn earliest<'a, I>(candidates: I) -> Option<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let groups = group_by_date(candidates);
    let (date, group) = groups.into_iter().next()?;
    pick_by_precedence(date, &group)
}

/// Alias of [`resolve_latest`] for call sites that read as selection rather
/// than reconciliation.
pub fn latest<'a, I>(candidates: I) -> Option<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    resolve_latest(candidates)
}

/// Resolve among candidates whose timestamp falls inside `window`.
pub fn resolve_within<'a, I>(candidates: I, window: &ReferenceWindow) -> Option<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let (start, end) = window.bounds()?;
    resolve_between(candidates, start, end)
}

/// Resolve among candidates timestamped in `[start, end]`.
pub fn resolve_between<'a, I>(candidates: I, start: NaiveDate, end: NaiveDate) -> Option<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    resolve_latest(candidates.into_iter().filter(|observation| {
        let timestamp = observation.timestamp();
        start <= timestamp && timestamp <= end
    }))
}

fn group_by_date<'a, I>(candidates: I) -> BTreeMap<NaiveDate, Vec<&'a Observation>>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut groups: BTreeMap<NaiveDate, Vec<&'a Observation>> = BTreeMap::new();
    for observation in candidates {
        groups
            .entry(observation.timestamp())
            .or_default()
            .push(observation);
    }
    groups
}

fn pick_by_precedence<'a>(date: NaiveDate, group: &[&'a Observation]) -> Option<&'a Observation> {
    let chosen = group
        .iter()
        .copied()
        .min_by(|left, right| left.precedence_cmp(right))?;
    if group.len() > 1 {
        trace!(
            %date,
            reports = group.len(),
            chosen = %chosen.instrument(),
            "same-date reports resolved by precedence"
        );
    }
    Some(chosen)
}
