//! Shipped cohort rules.
//!
//! | Rule | Result | Decides on |
//! |------|--------|------------|
//! | therapy-completion | flag | end event 173..=365 days after a start, or enough dispensations |
//! | lost-to-follow-up | flag | scheduled return more than 28 days before the reporting date |
//! | established-on-therapy | flag | therapy start more than 6 months before the reporting date |
//! | key-population | label | latest key population answer |
//! | dispensation-mode | label | latest dispensation type in the last 12 months |
//!
//! Thresholds are the defaults of [`crate::RuleSettings`].

mod common;
mod dispensation_mode;
mod established_on_therapy;
mod key_population;
mod lost_to_follow_up;
mod therapy_completion;

pub use dispensation_mode::DispensationModeRule;
pub use established_on_therapy::EstablishedOnTherapy;
pub use key_population::KeyPopulationRule;
pub use lost_to_follow_up::{LostToFollowUp, is_lost, scheduled_return};
pub use therapy_completion::{
    COUNT_DISPENSATIONS, TherapyCompletion, completed_within, dispensations_reach,
};
