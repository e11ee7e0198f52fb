//! Reference windows anchored at a date.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Signed offset from an anchor date, in days or calendar months.
///
/// Days and months are distinct units: a month offset follows the calendar
/// (clamping to the last day of shorter months) and is never converted to a
/// fixed number of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    Days(i32),
    Months(i32),
}

impl Offset {
    pub const ZERO: Offset = Offset::Days(0);
}

/// Shift `date` by `offset`. Returns `None` only when the result falls
/// outside the range chrono can represent.
pub fn shift(date: NaiveDate, offset: Offset) -> Option<NaiveDate> {
    match offset {
        Offset::Days(days) if days >= 0 => {
            date.checked_add_days(Days::new(u64::from(days.unsigned_abs())))
        }
        Offset::Days(days) => date.checked_sub_days(Days::new(u64::from(days.unsigned_abs()))),
        Offset::Months(months) if months >= 0 => {
            date.checked_add_months(Months::new(months.unsigned_abs()))
        }
        Offset::Months(months) => date.checked_sub_months(Months::new(months.unsigned_abs())),
    }
}

/// Admissible interval `[anchor + lower, anchor + upper]`, inclusive on both
/// ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceWindow {
    pub anchor: NaiveDate,
    pub lower: Offset,
    pub upper: Offset,
}

impl ReferenceWindow {
    pub fn new(anchor: NaiveDate, lower: Offset, upper: Offset) -> Self {
        Self {
            anchor,
            lower,
            upper,
        }
    }

    /// `[anchor, anchor + months]`.
    pub fn months_after(anchor: NaiveDate, months: i32) -> Self {
        Self::new(anchor, Offset::ZERO, Offset::Months(months))
    }

    /// `[anchor + lower_days, anchor + upper_days]`.
    pub fn days(anchor: NaiveDate, lower_days: i32, upper_days: i32) -> Self {
        Self::new(anchor, Offset::Days(lower_days), Offset::Days(upper_days))
    }

    /// `[anchor - months, anchor]`.
    pub fn months_before(anchor: NaiveDate, months: i32) -> Self {
        Self::new(anchor, Offset::Months(-months), Offset::ZERO)
    }

    /// Resolved inclusive bounds, or `None` if either bound is out of range.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((shift(self.anchor, self.lower)?, shift(self.anchor, self.upper)?))
    }

    /// Narrow the lower bound to `floor` when `floor` is later.
    pub fn clamp_start(&self, floor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let (start, end) = self.bounds()?;
        Some((start.max(floor), end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.bounds() {
            Some((start, end)) => start <= date && date <= end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_shift_clamps_to_month_end() {
        assert_eq!(
            shift(date(2024, 1, 31), Offset::Months(1)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            shift(date(2024, 3, 31), Offset::Months(-1)),
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn day_shift_is_signed() {
        assert_eq!(
            shift(date(2024, 1, 10), Offset::Days(176)),
            Some(date(2024, 7, 4))
        );
        assert_eq!(
            shift(date(2024, 1, 10), Offset::Days(-10)),
            Some(date(2023, 12, 31))
        );
    }

    #[test]
    fn window_is_inclusive() {
        let window = ReferenceWindow::months_after(date(2024, 1, 10), 6);
        assert!(window.contains(date(2024, 1, 10)));
        assert!(window.contains(date(2024, 7, 10)));
        assert!(!window.contains(date(2024, 7, 11)));
        assert!(!window.contains(date(2024, 1, 9)));
    }

    #[test]
    fn clamp_start_only_narrows() {
        let window = ReferenceWindow::months_before(date(2024, 12, 31), 12);
        assert_eq!(
            window.clamp_start(date(2024, 6, 1)),
            Some((date(2024, 6, 1), date(2024, 12, 31)))
        );
        assert_eq!(
            window.clamp_start(date(2020, 1, 1)),
            Some((date(2023, 12, 31), date(2024, 12, 31)))
        );
    }
}
