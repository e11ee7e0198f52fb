//! Building blocks shared by every cohort rule.
//!
//! - **resolver**: picks one authoritative observation among redundant
//!   instrument reports (latest date, then instrument precedence)
//! - **window**: counts qualifying visits inside a rolling calendar window,
//!   stopping once a target is reached
//! - **interval**: day and month differences, including the
//!   "N months and some days" threshold test

pub mod interval;
pub mod resolver;
pub mod window;

pub use interval::{Offset, days_between, in_range, is_beyond_threshold, months_diff, shift};
pub use resolver::{earliest, latest, resolve, resolve_between, resolve_latest, resolve_within};
pub use window::{count, count_in_window, reaches};
