//! Closed enumerations shared by the observation model and the rules.
//!
//! Every enumeration here is a fixed vocabulary: instruments, semantic fact
//! roles, coded answers and the labels a rule may emit. Parsing is
//! case-insensitive and rejects anything outside the vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of value a concept carries, as declared by the metadata dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Coded,
    Numeric,
    Date,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Coded => "coded",
            ValueKind::Numeric => "numeric",
            ValueKind::Date => "date",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-collection instrument (form or record type) that produced an
/// observation.
///
/// Declaration order is precedence order: when two instruments report the
/// same fact on the same effective date, the one declared first wins. The
/// ordinals returned by [`InstrumentTag::precedence`] are part of the
/// reporting contract and must not be reordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentTag {
    /// Adult clinical follow-up form.
    AdultFollowUp,
    /// Paediatric clinical follow-up form.
    PediatricFollowUp,
    /// Preventive-therapy register.
    TherapyRegister,
    /// Patient clinical summary form.
    ClinicalSummary,
    /// Pharmacy drug pick-up form.
    DrugPickup,
    /// Reception record confirming drugs were collected.
    PickupReception,
    /// Laboratory form.
    Laboratory,
    /// Person attribute record.
    PersonAttribute,
}

impl InstrumentTag {
    pub const ALL: [InstrumentTag; 8] = [
        InstrumentTag::AdultFollowUp,
        InstrumentTag::PediatricFollowUp,
        InstrumentTag::TherapyRegister,
        InstrumentTag::ClinicalSummary,
        InstrumentTag::DrugPickup,
        InstrumentTag::PickupReception,
        InstrumentTag::Laboratory,
        InstrumentTag::PersonAttribute,
    ];

    /// Precedence ordinal; lower wins.
    pub const fn precedence(self) -> u8 {
        match self {
            InstrumentTag::AdultFollowUp => 0,
            InstrumentTag::PediatricFollowUp => 1,
            InstrumentTag::TherapyRegister => 2,
            InstrumentTag::ClinicalSummary => 3,
            InstrumentTag::DrugPickup => 4,
            InstrumentTag::PickupReception => 5,
            InstrumentTag::Laboratory => 6,
            InstrumentTag::PersonAttribute => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentTag::AdultFollowUp => "adult_follow_up",
            InstrumentTag::PediatricFollowUp => "pediatric_follow_up",
            InstrumentTag::TherapyRegister => "therapy_register",
            InstrumentTag::ClinicalSummary => "clinical_summary",
            InstrumentTag::DrugPickup => "drug_pickup",
            InstrumentTag::PickupReception => "pickup_reception",
            InstrumentTag::Laboratory => "laboratory",
            InstrumentTag::PersonAttribute => "person_attribute",
        }
    }
}

impl fmt::Display for InstrumentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        InstrumentTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == normalized)
            .ok_or_else(|| format!("Unknown instrument: {s}"))
    }
}

/// Semantic role a candidate set plays for a rule.
///
/// The extraction collaborator splits observations by role and by
/// instrument; roles ending in `Date` carry date-valued facts whose
/// timestamp is the value itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactRole {
    TherapyStart,
    TherapyStartDate,
    TherapyEnd,
    TherapyEndDate,
    TherapyDispensation,
    DispensationType,
    ArtStart,
    ArtStartDate,
    NextConsultationDate,
    NextPickupDate,
    DrugPickup,
    KeyPopulation,
}

impl FactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactRole::TherapyStart => "therapy_start",
            FactRole::TherapyStartDate => "therapy_start_date",
            FactRole::TherapyEnd => "therapy_end",
            FactRole::TherapyEndDate => "therapy_end_date",
            FactRole::TherapyDispensation => "therapy_dispensation",
            FactRole::DispensationType => "dispensation_type",
            FactRole::ArtStart => "art_start",
            FactRole::ArtStartDate => "art_start_date",
            FactRole::NextConsultationDate => "next_consultation_date",
            FactRole::NextPickupDate => "next_pickup_date",
            FactRole::DrugPickup => "drug_pickup",
            FactRole::KeyPopulation => "key_population",
        }
    }
}

impl fmt::Display for FactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coded answers the rules understand.
///
/// The metadata dictionary maps its opaque concept identifiers onto this
/// set in a single lookup table; an identifier with no entry is simply not
/// an answer any rule recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedAnswer {
    Start,
    Continue,
    Completed,
    Monthly,
    Quarterly,
    Semiannual,
    MenWhoHaveSexWithMen,
    PeopleWhoInjectDrugs,
    SexWorker,
    Prisoner,
    Transgender,
}

impl CodedAnswer {
    pub fn key_population(self) -> Option<KeyPopulation> {
        match self {
            CodedAnswer::MenWhoHaveSexWithMen => Some(KeyPopulation::MenWhoHaveSexWithMen),
            CodedAnswer::PeopleWhoInjectDrugs => Some(KeyPopulation::PeopleWhoInjectDrugs),
            CodedAnswer::SexWorker => Some(KeyPopulation::SexWorker),
            CodedAnswer::Prisoner => Some(KeyPopulation::Prisoner),
            CodedAnswer::Transgender => Some(KeyPopulation::Transgender),
            _ => None,
        }
    }

    pub fn dispensation_mode(self) -> Option<DispensationMode> {
        match self {
            CodedAnswer::Monthly => Some(DispensationMode::Monthly),
            CodedAnswer::Quarterly => Some(DispensationMode::Quarterly),
            CodedAnswer::Semiannual => Some(DispensationMode::Semiannual),
            _ => None,
        }
    }
}

/// Key-population category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPopulation {
    MenWhoHaveSexWithMen,
    PeopleWhoInjectDrugs,
    SexWorker,
    Prisoner,
    Transgender,
}

impl KeyPopulation {
    pub const ALL: [KeyPopulation; 5] = [
        KeyPopulation::MenWhoHaveSexWithMen,
        KeyPopulation::PeopleWhoInjectDrugs,
        KeyPopulation::SexWorker,
        KeyPopulation::Prisoner,
        KeyPopulation::Transgender,
    ];

    /// Short code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            KeyPopulation::MenWhoHaveSexWithMen => "MSM",
            KeyPopulation::PeopleWhoInjectDrugs => "PWID",
            KeyPopulation::SexWorker => "SW",
            KeyPopulation::Prisoner => "PRISONER",
            KeyPopulation::Transgender => "TG",
        }
    }
}

impl fmt::Display for KeyPopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Differentiated dispensation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispensationMode {
    Monthly,
    Quarterly,
    Semiannual,
}

impl DispensationMode {
    pub const ALL: [DispensationMode; 3] = [
        DispensationMode::Monthly,
        DispensationMode::Quarterly,
        DispensationMode::Semiannual,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DispensationMode::Monthly => "MONTHLY",
            DispensationMode::Quarterly => "QUARTERLY",
            DispensationMode::Semiannual => "SEMIANNUAL",
        }
    }
}

impl fmt::Display for DispensationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_declaration_order_matches_precedence() {
        let mut sorted = InstrumentTag::ALL;
        sorted.sort();
        for (index, tag) in sorted.iter().enumerate() {
            assert_eq!(usize::from(tag.precedence()), index, "{tag}");
        }
    }

    #[test]
    fn instrument_from_str() {
        assert_eq!(
            "Drug-Pickup".parse::<InstrumentTag>().unwrap(),
            InstrumentTag::DrugPickup
        );
        assert_eq!(
            "adult follow up".parse::<InstrumentTag>().unwrap(),
            InstrumentTag::AdultFollowUp
        );
        assert!("pharmacy".parse::<InstrumentTag>().is_err());
    }

    #[test]
    fn answers_map_to_labels() {
        assert_eq!(
            CodedAnswer::SexWorker.key_population(),
            Some(KeyPopulation::SexWorker)
        );
        assert_eq!(CodedAnswer::Completed.key_population(), None);
        assert_eq!(
            CodedAnswer::Quarterly.dispensation_mode(),
            Some(DispensationMode::Quarterly)
        );
        assert_eq!(CodedAnswer::Start.dispensation_mode(), None);
    }
}
