//! Metadata dictionary boundary.
//!
//! The dictionary resolves the opaque concept identifiers used by the data
//! store into the two things the core needs: the value kind each concept
//! declares, and which [`CodedAnswer`] (if any) a coded value stands for.
//! Display text is never consulted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{CodedAnswer, ValueKind};
use crate::ids::ConceptId;

/// Read-only view of the metadata collaborator.
pub trait ConceptDictionary: Send + Sync {
    /// Declared value kind of `concept`, or `None` if the concept is unknown.
    fn value_kind(&self, concept: ConceptId) -> Option<ValueKind>;

    /// The coded answer `value` stands for, or `None` if it is not one the
    /// rules recognise.
    fn answer(&self, value: ConceptId) -> Option<CodedAnswer>;
}

/// Dictionary held entirely in memory, loadable from JSON or TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DictionaryTable", into = "DictionaryTable")]
pub struct InMemoryDictionary {
    kinds: BTreeMap<ConceptId, ValueKind>,
    answers: BTreeMap<ConceptId, CodedAnswer>,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_concept(mut self, concept: ConceptId, kind: ValueKind) -> Self {
        self.kinds.insert(concept, kind);
        self
    }

    /// Register `value` as the identifier for `answer`. Answers are coded
    /// concepts themselves, so they are also declared with kind `Coded`.
    #[must_use]
    pub fn with_answer(mut self, value: ConceptId, answer: CodedAnswer) -> Self {
        self.answers.insert(value, answer);
        self.kinds.entry(value).or_insert(ValueKind::Coded);
        self
    }

    /// Identifier registered for `answer`, if any. When several identifiers
    /// map to the same answer the smallest is returned.
    pub fn answer_id(&self, answer: CodedAnswer) -> Option<ConceptId> {
        self.answers
            .iter()
            .find(|(_, candidate)| **candidate == answer)
            .map(|(id, _)| *id)
    }

    pub fn concept_count(&self) -> usize {
        self.kinds.len()
    }
}

impl ConceptDictionary for InMemoryDictionary {
    fn value_kind(&self, concept: ConceptId) -> Option<ValueKind> {
        self.kinds.get(&concept).copied()
    }

    fn answer(&self, value: ConceptId) -> Option<CodedAnswer> {
        self.answers.get(&value).copied()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DictionaryTable {
    #[serde(default)]
    concepts: Vec<ConceptEntry>,
    #[serde(default)]
    answers: Vec<AnswerEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConceptEntry {
    id: ConceptId,
    kind: ValueKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnswerEntry {
    id: ConceptId,
    answer: CodedAnswer,
}

impl From<DictionaryTable> for InMemoryDictionary {
    fn from(table: DictionaryTable) -> Self {
        let mut dictionary = InMemoryDictionary::new();
        for entry in table.concepts {
            dictionary = dictionary.with_concept(entry.id, entry.kind);
        }
        for entry in table.answers {
            dictionary = dictionary.with_answer(entry.id, entry.answer);
        }
        dictionary
    }
}

impl From<InMemoryDictionary> for DictionaryTable {
    fn from(dictionary: InMemoryDictionary) -> Self {
        let answers: Vec<AnswerEntry> = dictionary
            .answers
            .iter()
            .map(|(id, answer)| AnswerEntry {
                id: *id,
                answer: *answer,
            })
            .collect();
        let concepts = dictionary
            .kinds
            .into_iter()
            .filter(|(id, kind)| {
                !(dictionary.answers.contains_key(id) && *kind == ValueKind::Coded)
            })
            .map(|(id, kind)| ConceptEntry { id, kind })
            .collect();
        Self { concepts, answers }
    }
}
