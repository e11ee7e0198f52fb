use chrono::NaiveDate;
use cohort_model::{
    CodedAnswer, ConceptDictionary, FactRole, Observation, SubjectObservations,
};

/// Dictionary meaning of a coded observation, if any.
pub(super) fn answer_of(
    observation: &Observation,
    dictionary: &dyn ConceptDictionary,
) -> Option<CodedAnswer> {
    observation
        .value()
        .as_coded()
        .and_then(|value| dictionary.answer(value))
}

pub(super) fn has_answer(
    observation: &Observation,
    dictionary: &dyn ConceptDictionary,
    expected: CodedAnswer,
) -> bool {
    answer_of(observation, dictionary) == Some(expected)
}

/// Event dates from a coded role answered `answer` (timed by encounter) and
/// from a date role (timed by value), on or before `until`.
///
/// Every instrument contributes. Duplicates are dropped and the result is
/// ascending, so each plausible event is evaluated once.
pub(super) fn event_dates(
    observations: &SubjectObservations,
    dictionary: &dyn ConceptDictionary,
    coded_role: FactRole,
    answer: CodedAnswer,
    date_role: FactRole,
    until: NaiveDate,
) -> Vec<NaiveDate> {
    let coded = observations
        .observations(coded_role)
        .filter(|observation| has_answer(observation, dictionary, answer));
    let dated = observations.observations(date_role);
    let mut dates: Vec<NaiveDate> = coded
        .chain(dated)
        .map(Observation::timestamp)
        .filter(|date| *date <= until)
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}
