//! End-to-end rule outcomes for hand-built subjects.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use cohort_model::{
    ClassificationResult, CodedAnswer, ConceptId, DispensationMode, EncounterId,
    EvaluationParams, FactRole, InMemoryDictionary, InstrumentTag, KeyPopulation, LocationId,
    ObservationRecord, SubjectId, TimestampBasis, ValueKind,
};
use cohort_rules::{
    BatchEvaluator, InMemorySource, RuleContext, RuleSettings, assemble, default_registry,
};

const THERAPY_START: u32 = 1000;
const THERAPY_START_DATE: u32 = 1001;
const THERAPY_END: u32 = 1002;
const THERAPY_END_DATE: u32 = 1003;
const DISPENSATION: u32 = 1004;
const DISPENSATION_TYPE: u32 = 1005;
const ART_START: u32 = 1006;
const ART_START_DATE: u32 = 1007;
const NEXT_PICKUP: u32 = 1009;
const PICKUP: u32 = 1010;
const KEY_POPULATION: u32 = 1011;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn subject(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

fn answer(answer: CodedAnswer) -> ConceptId {
    let id = match answer {
        CodedAnswer::Start => 1256,
        CodedAnswer::Continue => 1257,
        CodedAnswer::Completed => 1267,
        CodedAnswer::Monthly => 1098,
        CodedAnswer::Quarterly => 23720,
        CodedAnswer::Semiannual => 23888,
        CodedAnswer::MenWhoHaveSexWithMen => 1377,
        CodedAnswer::PeopleWhoInjectDrugs => 20454,
        CodedAnswer::SexWorker => 1901,
        CodedAnswer::Prisoner => 20426,
        CodedAnswer::Transgender => 165205,
    };
    ConceptId::new(id)
}

fn dictionary() -> InMemoryDictionary {
    let mut dictionary = InMemoryDictionary::new();
    for (concept, kind) in [
        (THERAPY_START, ValueKind::Coded),
        (THERAPY_START_DATE, ValueKind::Date),
        (THERAPY_END, ValueKind::Coded),
        (THERAPY_END_DATE, ValueKind::Date),
        (DISPENSATION, ValueKind::Coded),
        (DISPENSATION_TYPE, ValueKind::Coded),
        (ART_START, ValueKind::Coded),
        (ART_START_DATE, ValueKind::Date),
        (NEXT_PICKUP, ValueKind::Date),
        (PICKUP, ValueKind::Numeric),
        (KEY_POPULATION, ValueKind::Coded),
    ] {
        dictionary = dictionary.with_concept(ConceptId::new(concept), kind);
    }
    for coded in [
        CodedAnswer::Start,
        CodedAnswer::Continue,
        CodedAnswer::Completed,
        CodedAnswer::Monthly,
        CodedAnswer::Quarterly,
        CodedAnswer::Semiannual,
        CodedAnswer::MenWhoHaveSexWithMen,
        CodedAnswer::PeopleWhoInjectDrugs,
        CodedAnswer::SexWorker,
        CodedAnswer::Prisoner,
        CodedAnswer::Transgender,
    ] {
        dictionary = dictionary.with_answer(answer(coded), coded);
    }
    dictionary
}

fn coded(
    role: FactRole,
    instrument: InstrumentTag,
    concept: u32,
    value: CodedAnswer,
    day: NaiveDate,
) -> ObservationRecord {
    ObservationRecord::coded(role, instrument, ConceptId::new(concept), answer(value), day)
}

fn dated(role: FactRole, instrument: InstrumentTag, concept: u32, day: NaiveDate) -> ObservationRecord {
    ObservationRecord::date(role, instrument, ConceptId::new(concept), day)
}

/// A return date recorded at a visit: timed by the visit, valued by the
/// scheduled date.
fn scheduled_at(visit: NaiveDate, scheduled: NaiveDate, encounter: u64) -> ObservationRecord {
    let mut record = dated(
        FactRole::NextPickupDate,
        InstrumentTag::DrugPickup,
        NEXT_PICKUP,
        scheduled,
    )
    .with_encounter(EncounterId::new(encounter), visit);
    record.basis = TimestampBasis::EncounterDate;
    record
}

fn dispensation_visit(day: NaiveDate, encounter: u64, mode: CodedAnswer) -> [ObservationRecord; 2] {
    let encounter = EncounterId::new(encounter);
    [
        coded(
            FactRole::TherapyDispensation,
            InstrumentTag::DrugPickup,
            DISPENSATION,
            CodedAnswer::Continue,
            day,
        )
        .with_encounter_id(encounter),
        coded(
            FactRole::DispensationType,
            InstrumentTag::DrugPickup,
            DISPENSATION_TYPE,
            mode,
            day,
        )
        .with_encounter_id(encounter),
    ]
}

fn params(on_or_before: NaiveDate) -> EvaluationParams {
    EvaluationParams::new(LocationId::new(1)).with_on_or_before(on_or_before)
}

fn evaluate(
    source: &InMemorySource,
    rule: &str,
    params: &EvaluationParams,
) -> BTreeMap<SubjectId, ClassificationResult> {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, source, &settings);
    evaluator
        .evaluate(&source.cohort(), rule, params)
        .unwrap()
        .into_results()
}

#[test]
fn completion_inside_day_range_is_positive() {
    let source = InMemorySource::new().with_subject(
        subject("A"),
        vec![
            coded(
                FactRole::TherapyStart,
                InstrumentTag::AdultFollowUp,
                THERAPY_START,
                CodedAnswer::Start,
                date(2024, 1, 10),
            ),
            coded(
                FactRole::TherapyEnd,
                InstrumentTag::AdultFollowUp,
                THERAPY_END,
                CodedAnswer::Completed,
                date(2024, 7, 5),
            ),
        ],
    );
    let results = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert_eq!(results.get(&subject("A")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn completion_before_lower_bound_is_negative() {
    let source = InMemorySource::new().with_subject(
        subject("B"),
        vec![
            coded(
                FactRole::TherapyStart,
                InstrumentTag::AdultFollowUp,
                THERAPY_START,
                CodedAnswer::Start,
                date(2024, 1, 10),
            ),
            dated(
                FactRole::TherapyEndDate,
                InstrumentTag::AdultFollowUp,
                THERAPY_END_DATE,
                date(2024, 6, 1),
            ),
        ],
    );
    let results = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert_eq!(results.get(&subject("B")), Some(&ClassificationResult::Flag(false)));
}

#[test]
fn any_qualifying_start_candidate_is_enough() {
    // 370 days after the first start, 356 after the second.
    let source = InMemorySource::new().with_subject(
        subject("C"),
        vec![
            dated(
                FactRole::TherapyStartDate,
                InstrumentTag::AdultFollowUp,
                THERAPY_START_DATE,
                date(2024, 2, 1),
            ),
            dated(
                FactRole::TherapyStartDate,
                InstrumentTag::ClinicalSummary,
                THERAPY_START_DATE,
                date(2024, 2, 15),
            ),
            dated(
                FactRole::TherapyEndDate,
                InstrumentTag::ClinicalSummary,
                THERAPY_END_DATE,
                date(2025, 2, 5),
            ),
        ],
    );
    let results = evaluate(&source, "therapy-completion", &params(date(2025, 3, 31)));
    assert_eq!(results.get(&subject("C")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn no_start_event_is_undetermined() {
    let source = InMemorySource::new().with_subject(
        subject("D"),
        vec![coded(
            FactRole::TherapyEnd,
            InstrumentTag::AdultFollowUp,
            THERAPY_END,
            CodedAnswer::Completed,
            date(2024, 7, 5),
        )],
    );
    let results = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert!(results.is_empty());
}

#[test]
fn monthly_dispensations_complete_the_course() {
    let start = date(2024, 1, 10);
    let mut records = vec![coded(
        FactRole::TherapyStart,
        InstrumentTag::DrugPickup,
        THERAPY_START,
        CodedAnswer::Start,
        start,
    )];
    for (index, month) in (1..=6).enumerate() {
        records.extend(dispensation_visit(
            date(2024, month, 10),
            index as u64 + 1,
            CodedAnswer::Monthly,
        ));
    }
    let source = InMemorySource::new().with_subject(subject("M"), records);

    let counted = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert_eq!(counted.get(&subject("M")), Some(&ClassificationResult::Flag(true)));

    let without = params(date(2024, 12, 31)).with_flag(cohort_rules::rules::COUNT_DISPENSATIONS, false);
    let uncounted = evaluate(&source, "therapy-completion", &without);
    assert_eq!(uncounted.get(&subject("M")), Some(&ClassificationResult::Flag(false)));
}

#[test]
fn dispensations_after_reporting_date_do_not_count() {
    let start = date(2024, 1, 10);
    let mut records = vec![coded(
        FactRole::TherapyStart,
        InstrumentTag::DrugPickup,
        THERAPY_START,
        CodedAnswer::Start,
        start,
    )];
    for (index, month) in (2..=7).enumerate() {
        records.extend(dispensation_visit(
            date(2024, month, 10),
            index as u64 + 1,
            CodedAnswer::Monthly,
        ));
    }
    let dictionary = dictionary();
    let (observations, report) = assemble(&subject("LATE"), &records, &dictionary);
    assert_eq!(report.rejected, 0);

    let registry = default_registry();
    let rule = registry.get("therapy-completion").unwrap();
    let settings = RuleSettings::default();
    let early = params(date(2024, 3, 1));
    let context = RuleContext::new(&early, &dictionary, &settings);
    assert_eq!(rule.classify(&observations, &context), Some(ClassificationResult::Flag(false)));

    let late = params(date(2024, 12, 31));
    let context = RuleContext::new(&late, &dictionary, &settings);
    assert_eq!(rule.classify(&observations, &context), Some(ClassificationResult::Flag(true)));
}

#[test]
fn dispensations_of_another_mode_do_not_count() {
    let mut records = vec![coded(
        FactRole::TherapyStart,
        InstrumentTag::DrugPickup,
        THERAPY_START,
        CodedAnswer::Start,
        date(2024, 1, 10),
    )];
    records.extend(dispensation_visit(date(2024, 1, 10), 1, CodedAnswer::Semiannual));
    records.extend(dispensation_visit(date(2024, 4, 10), 2, CodedAnswer::Quarterly));
    let source = InMemorySource::new().with_subject(subject("Q"), records);
    let results = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert_eq!(results.get(&subject("Q")), Some(&ClassificationResult::Flag(false)));

    let mut quarterly = vec![coded(
        FactRole::TherapyStart,
        InstrumentTag::DrugPickup,
        THERAPY_START,
        CodedAnswer::Start,
        date(2024, 1, 10),
    )];
    quarterly.extend(dispensation_visit(date(2024, 1, 10), 1, CodedAnswer::Quarterly));
    quarterly.extend(dispensation_visit(date(2024, 4, 10), 2, CodedAnswer::Quarterly));
    let source = InMemorySource::new().with_subject(subject("Q"), quarterly);
    let results = evaluate(&source, "therapy-completion", &params(date(2024, 12, 31)));
    assert_eq!(results.get(&subject("Q")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn subjects_are_classified_independently() {
    let positive = vec![
        coded(
            FactRole::TherapyStart,
            InstrumentTag::AdultFollowUp,
            THERAPY_START,
            CodedAnswer::Start,
            date(2024, 1, 10),
        ),
        coded(
            FactRole::TherapyEnd,
            InstrumentTag::AdultFollowUp,
            THERAPY_END,
            CodedAnswer::Completed,
            date(2024, 7, 5),
        ),
    ];
    let negative = vec![coded(
        FactRole::TherapyStart,
        InstrumentTag::AdultFollowUp,
        THERAPY_START,
        CodedAnswer::Start,
        date(2024, 3, 1),
    )];
    let on = params(date(2024, 12, 31));

    let alone = InMemorySource::new().with_subject(subject("A"), positive.clone());
    let alone = evaluate(&alone, "therapy-completion", &on);

    let mut crowd = InMemorySource::new().with_subject(subject("A"), positive);
    for index in 0..50 {
        crowd.insert(subject(&format!("N-{index:02}")), negative.clone());
    }
    let crowd = evaluate(&crowd, "therapy-completion", &on);

    assert_eq!(alone.get(&subject("A")), crowd.get(&subject("A")));
    assert_eq!(crowd.len(), 51);
    assert_eq!(
        crowd
            .values()
            .filter(|result| **result == ClassificationResult::Flag(false))
            .count(),
        50
    );
}

#[test]
fn missed_return_beyond_grace_is_lost() {
    let until = date(2024, 7, 15);
    let source = InMemorySource::new()
        .with_subject(
            subject("LOST"),
            vec![scheduled_at(date(2024, 5, 1), date(2024, 6, 1), 1)],
        )
        .with_subject(
            subject("ACTIVE"),
            vec![scheduled_at(date(2024, 6, 1), date(2024, 7, 1), 2)],
        )
        .with_subject(
            subject("PICKED-UP"),
            vec![
                scheduled_at(date(2024, 5, 1), date(2024, 6, 1), 3),
                ObservationRecord::numeric(
                    FactRole::DrugPickup,
                    InstrumentTag::PickupReception,
                    ConceptId::new(PICKUP),
                    30.0,
                    date(2024, 6, 20),
                ),
            ],
        )
        .with_subject(subject("UNKNOWN"), Vec::new());
    let results = evaluate(&source, "lost-to-follow-up", &params(until));
    assert_eq!(results.get(&subject("LOST")), Some(&ClassificationResult::Flag(true)));
    assert_eq!(results.get(&subject("ACTIVE")), Some(&ClassificationResult::Flag(false)));
    assert_eq!(results.get(&subject("PICKED-UP")), Some(&ClassificationResult::Flag(false)));
    assert_eq!(results.get(&subject("UNKNOWN")), None);
}

#[test]
fn later_visits_than_reporting_date_are_ignored() {
    let source = InMemorySource::new().with_subject(
        subject("LOST"),
        vec![
            scheduled_at(date(2024, 5, 1), date(2024, 6, 1), 1),
            scheduled_at(date(2024, 8, 1), date(2024, 9, 1), 2),
        ],
    );
    let results = evaluate(&source, "lost-to-follow-up", &params(date(2024, 7, 15)));
    assert_eq!(results.get(&subject("LOST")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn therapy_duration_uses_residual_days() {
    let source = InMemorySource::new()
        .with_subject(
            subject("EXACT"),
            vec![dated(
                FactRole::ArtStartDate,
                InstrumentTag::TherapyRegister,
                ART_START_DATE,
                date(2024, 1, 10),
            )],
        )
        .with_subject(
            subject("LONGER"),
            vec![dated(
                FactRole::ArtStartDate,
                InstrumentTag::TherapyRegister,
                ART_START_DATE,
                date(2024, 1, 9),
            )],
        );
    let results = evaluate(&source, "established-on-therapy", &params(date(2024, 7, 10)));
    assert_eq!(results.get(&subject("EXACT")), Some(&ClassificationResult::Flag(false)));
    assert_eq!(results.get(&subject("LONGER")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn reporting_period_start_keeps_earlier_history() {
    let source = InMemorySource::new().with_subject(
        subject("ART"),
        vec![coded(
            FactRole::ArtStart,
            InstrumentTag::AdultFollowUp,
            ART_START,
            CodedAnswer::Start,
            date(2020, 1, 1),
        )],
    );
    let until = date(2024, 12, 31);
    let open = evaluate(&source, "established-on-therapy", &params(until));
    assert_eq!(open.get(&subject("ART")), Some(&ClassificationResult::Flag(true)));

    let period = params(until).with_on_or_after(date(2024, 10, 1));
    let bounded = evaluate(&source, "established-on-therapy", &period);
    assert_eq!(bounded.get(&subject("ART")), Some(&ClassificationResult::Flag(true)));
}

#[test]
fn key_population_prefers_latest_then_precedence() {
    let kp = |instrument, value, day| {
        coded(FactRole::KeyPopulation, instrument, KEY_POPULATION, value, day)
    };
    let source = InMemorySource::new()
        .with_subject(
            subject("LATEST"),
            vec![
                kp(InstrumentTag::AdultFollowUp, CodedAnswer::SexWorker, date(2024, 3, 1)),
                kp(
                    InstrumentTag::PersonAttribute,
                    CodedAnswer::MenWhoHaveSexWithMen,
                    date(2024, 5, 1),
                ),
                kp(InstrumentTag::AdultFollowUp, CodedAnswer::Continue, date(2024, 6, 1)),
            ],
        )
        .with_subject(
            subject("TIED"),
            vec![
                kp(
                    InstrumentTag::PersonAttribute,
                    CodedAnswer::MenWhoHaveSexWithMen,
                    date(2024, 5, 1),
                ),
                kp(InstrumentTag::AdultFollowUp, CodedAnswer::SexWorker, date(2024, 5, 1)),
            ],
        );
    let results = evaluate(&source, "key-population", &params(date(2024, 12, 31)));
    assert_eq!(
        results.get(&subject("LATEST")),
        Some(&ClassificationResult::from(KeyPopulation::MenWhoHaveSexWithMen))
    );
    assert_eq!(
        results.get(&subject("TIED")),
        Some(&ClassificationResult::from(KeyPopulation::SexWorker))
    );
}

#[test]
fn dispensation_mode_respects_lookback_and_floor() {
    let kind = |value, day| {
        coded(
            FactRole::DispensationType,
            InstrumentTag::DrugPickup,
            DISPENSATION_TYPE,
            value,
            day,
        )
    };
    let source = InMemorySource::new().with_subject(
        subject("DM"),
        vec![
            kind(CodedAnswer::Quarterly, date(2023, 6, 1)),
            kind(CodedAnswer::Monthly, date(2024, 3, 1)),
        ],
    );
    let until = date(2024, 12, 31);
    let results = evaluate(&source, "dispensation-mode", &params(until));
    assert_eq!(
        results.get(&subject("DM")),
        Some(&ClassificationResult::from(DispensationMode::Monthly))
    );

    let floored = params(until).with_on_or_after(date(2024, 6, 1));
    let results = evaluate(&source, "dispensation-mode", &floored);
    assert!(results.is_empty());

    let stale = params(date(2025, 6, 1));
    let results = evaluate(&source, "dispensation-mode", &stale);
    assert!(results.is_empty());
}
