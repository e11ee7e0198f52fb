//! Rolling-window occurrence counting.
//!
//! Callers only ever ask "at least N occurrences?", so counting stops as
//! soon as the target is reached. The returned value is therefore
//! `min(target, true_count)`.

use chrono::NaiveDate;
use cohort_model::{CandidateSet, ReferenceWindow};

/// Count observations of `primary` whose encounter date lies in
/// `[anchor, anchor + window_months]`, stopping at `target_count`.
///
/// With a `filter`, an observation only counts when its encounter also
/// appears in `filter` (same physical visit, not the same value).
/// Observations without an encounter date are skipped, as are observations
/// without an encounter id when a filter is given.
pub fn count(
    primary: &CandidateSet,
    filter: Option<&CandidateSet>,
    anchor: NaiveDate,
    target_count: usize,
    window_months: u32,
) -> usize {
    let months = i32::try_from(window_months).unwrap_or(i32::MAX);
    count_in_window(
        primary,
        filter,
        &ReferenceWindow::months_after(anchor, months),
        target_count,
    )
}

/// [`count`] against an arbitrary window.
pub fn count_in_window(
    primary: &CandidateSet,
    filter: Option<&CandidateSet>,
    window: &ReferenceWindow,
    target_count: usize,
) -> usize {
    let Some((start, end)) = window.bounds() else {
        return 0;
    };
    let mut reached = 0;
    if target_count == 0 {
        return reached;
    }
    for observation in primary {
        let Some(encounter_date) = observation.encounter_date() else {
            continue;
        };
        if encounter_date < start || encounter_date > end {
            continue;
        }
        if let Some(filter) = filter {
            let same_visit = observation
                .encounter_id()
                .is_some_and(|encounter| filter.contains_encounter(encounter));
            if !same_visit {
                continue;
            }
        }
        reached += 1;
        if reached >= target_count {
            break;
        }
    }
    reached
}

/// Threshold form of [`count`].
pub fn reaches(
    primary: &CandidateSet,
    filter: Option<&CandidateSet>,
    anchor: NaiveDate,
    target_count: usize,
    window_months: u32,
) -> bool {
    count(primary, filter, anchor, target_count, window_months) >= target_count
}
