use chrono::NaiveDate;
use cohort_model::{
    ClassificationResult, CodedAnswer, ConceptId, EvaluationParams, FactRole, InMemoryDictionary,
    InstrumentTag, LocationId, ObservationRecord, ObservationValue, SubjectId, ValueKind,
};
use cohort_rules::{
    BatchEvaluator, EvaluationError, InMemorySource, RuleSettings, default_registry,
};

const START: u32 = 1000;
const END_DATE: u32 = 1003;
const START_ANSWER: u32 = 1256;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn subject(id: &str) -> SubjectId {
    SubjectId::new(id).unwrap()
}

fn dictionary() -> InMemoryDictionary {
    InMemoryDictionary::new()
        .with_concept(ConceptId::new(START), ValueKind::Coded)
        .with_concept(ConceptId::new(END_DATE), ValueKind::Date)
        .with_answer(ConceptId::new(START_ANSWER), CodedAnswer::Start)
}

fn start(day: NaiveDate) -> ObservationRecord {
    ObservationRecord::coded(
        FactRole::TherapyStart,
        InstrumentTag::AdultFollowUp,
        ConceptId::new(START),
        ConceptId::new(START_ANSWER),
        day,
    )
}

fn end(day: NaiveDate) -> ObservationRecord {
    ObservationRecord::date(
        FactRole::TherapyEndDate,
        InstrumentTag::AdultFollowUp,
        ConceptId::new(END_DATE),
        day,
    )
}

fn source() -> InMemorySource {
    let mut malformed = end(date(2024, 7, 5));
    malformed.value = Some(ObservationValue::Numeric(177.0));
    InMemorySource::new()
        .with_subject(subject("P-1"), vec![start(date(2024, 1, 10)), end(date(2024, 7, 5))])
        .with_subject(subject("P-2"), vec![start(date(2024, 1, 10)), malformed])
        .with_subject(subject("P-3"), Vec::new())
}

#[test]
fn missing_reporting_date_fails_before_evaluation() {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let source = source();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1));

    let error = evaluator
        .evaluate(&source.cohort(), "therapy-completion", &params)
        .unwrap_err();
    assert!(matches!(
        error,
        EvaluationError::MissingMandatoryParameter {
            rule: "therapy-completion",
            parameter: "onOrBefore",
        }
    ));
    assert!(evaluator.evaluate_all(&source.cohort(), &params).is_err());
}

#[test]
fn unknown_and_disabled_rules_are_rejected() {
    let mut registry = default_registry();
    registry.disable("key-population");
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let source = source();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1)).with_on_or_before(date(2024, 12, 31));

    assert!(matches!(
        evaluator.evaluate(&source.cohort(), "no-such-rule", &params),
        Err(EvaluationError::UnknownRule(_))
    ));
    assert!(matches!(
        evaluator.evaluate(&source.cohort(), "key-population", &params),
        Err(EvaluationError::DisabledRule(_))
    ));
    let all = evaluator.evaluate_all(&source.cohort(), &params).unwrap();
    let ids: Vec<&str> = all.iter().map(|results| results.rule()).collect();
    assert_eq!(
        ids,
        vec![
            "dispensation-mode",
            "established-on-therapy",
            "lost-to-follow-up",
            "therapy-completion",
        ]
    );
}

#[test]
fn malformed_records_are_counted_and_skipped() {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let source = source();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1)).with_on_or_before(date(2024, 12, 31));

    let results = evaluator
        .evaluate(&source.cohort(), "therapy-completion", &params)
        .unwrap();
    assert_eq!(results.evaluated(), 3);
    assert_eq!(results.rejected_observations(), 1);
    assert_eq!(results.get(&subject("P-1")), Some(ClassificationResult::Flag(true)));
    assert_eq!(results.get(&subject("P-2")), Some(ClassificationResult::Flag(false)));
    assert_eq!(results.get(&subject("P-3")), None);
    assert_eq!(results.positive_count(), 1);
    assert_eq!(results.negative_count(), 1);
    assert_eq!(results.undetermined_count(), 1);
}

#[test]
fn settings_change_thresholds() {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::from_toml_str("[therapy_completion]\nmin_days = 180\n").unwrap();
    let source = source();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1)).with_on_or_before(date(2024, 12, 31));

    let results = evaluator
        .evaluate(&source.cohort(), "therapy-completion", &params)
        .unwrap();
    assert_eq!(results.get(&subject("P-1")), Some(ClassificationResult::Flag(false)));
}

#[test]
fn other_locations_are_not_fetched() {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let mut source = source();
    source.set_location(&subject("P-1"), LocationId::new(2));
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1)).with_on_or_before(date(2024, 12, 31));

    let results = evaluator
        .evaluate(&source.cohort(), "therapy-completion", &params)
        .unwrap();
    assert_eq!(results.get(&subject("P-1")), None);
}

#[test]
fn cohort_results_serialize_by_subject() {
    let registry = default_registry();
    let dictionary = dictionary();
    let settings = RuleSettings::default();
    let source = source();
    let evaluator = BatchEvaluator::new(&registry, &dictionary, &source, &settings);
    let params = EvaluationParams::new(LocationId::new(1)).with_on_or_before(date(2024, 12, 31));

    let results = evaluator
        .evaluate(&source.cohort(), "therapy-completion", &params)
        .unwrap();
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json["rule"], "therapy-completion");
    assert_eq!(json["results"]["P-1"], serde_json::json!({ "flag": true }));
    assert_eq!(json["observations"]["rejected"], 1);
}
