//! Day and month interval arithmetic.
//!
//! Clinical guidance is written in both units ("173 days", "6 months") and
//! the two are not convertible by a fixed factor, so both primitives are
//! kept. Month arithmetic follows the calendar via [`cohort_model::shift`].

use chrono::{Datelike, NaiveDate};
pub use cohort_model::{Offset, shift};

/// Signed number of days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Whole calendar months from `a` to `b`, truncated.
///
/// For `b >= a` this is the largest `m` such that `b` minus `m` months is
/// still on or after `a`; for `b < a` it is the negated difference.
pub fn months_diff(a: NaiveDate, b: NaiveDate) -> i32 {
    if b < a {
        return -months_diff(b, a);
    }
    let mut months = (b.year() - a.year()) * 12 + (b.month() as i32 - a.month() as i32);
    if months > 0 && shift(b, Offset::Months(-months)).is_none_or(|reduced| reduced < a) {
        months -= 1;
    }
    months
}

/// Whether `b` lies strictly beyond `threshold_months` after `a`.
///
/// True when the truncated month difference exceeds the threshold, or
/// equals it and at least one day remains after taking the threshold's whole
/// months off `b`. Exactly N months is on time; N months and a day is late.
pub fn is_beyond_threshold(a: NaiveDate, b: NaiveDate, threshold_months: u32) -> bool {
    let threshold = i32::try_from(threshold_months).unwrap_or(i32::MAX);
    let months = months_diff(a, b);
    if months != threshold {
        return months > threshold;
    }
    match shift(b, Offset::Months(-threshold)) {
        Some(reduced) => days_between(a, reduced) > 0,
        None => false,
    }
}

/// Whether `candidate` lies within `[reference + lower_days, reference + upper_days]`.
pub fn in_range(reference: NaiveDate, candidate: NaiveDate, lower_days: i64, upper_days: i64) -> bool {
    let days = days_between(reference, candidate);
    lower_days <= days && days <= upper_days
}
