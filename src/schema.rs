use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::SampleKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeMismatch {
    #[schemars(description = "The sample text as written in the document (trimmed, original casing)")]
    pub text: String,

    #[schemars(description = "The type tag declared next to the sample")]
    pub declared: String,

    #[schemars(description = "The type the text looks like")]
    pub expected: SampleKind,
}

/// One intent as seen by a single document, after normalization.
///
/// Built once per document parse and never mutated by comparisons.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalIntent {
    pub name: String,

    #[schemars(description = "Trimmed, lower-cased sample texts; duplicates collapsed")]
    pub phrases: BTreeSet<String>,

    #[schemars(description = "Priority as found in the document, compared by equality only")]
    pub priority: Option<Value>,

    #[schemars(description = "Declared type tag per normalized phrase (last declaration wins)")]
    pub phrase_types: BTreeMap<String, String>,

    #[serde(default)]
    pub type_mismatches: Vec<TypeMismatch>,
}

impl CanonicalIntent {
    pub fn new(name: impl Into<String>, priority: Option<Value>) -> Self {
        Self {
            name: name.into(),
            priority,
            ..Default::default()
        }
    }

    /// Records a sample. Blank text is ignored; returns whether the sample was kept.
    pub fn add_sample(&mut self, text: &str, declared_type: impl Into<String>) -> bool {
        let phrase = crate::utils::normalize_phrase(text);
        if phrase.is_empty() {
            return false;
        }
        self.phrase_types.insert(phrase.clone(), declared_type.into());
        self.phrases.insert(phrase);
        true
    }

    pub fn contains_phrase(&self, text: &str) -> bool {
        self.phrases.contains(&crate::utils::normalize_phrase(text))
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }
}

/// All intents extracted from one document, keyed by intent name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CanonicalModel {
    intents: BTreeMap<String, CanonicalIntent>,
}

impl CanonicalModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an intent, replacing any earlier intent with the same name.
    pub fn insert(&mut self, intent: CanonicalIntent) -> Option<CanonicalIntent> {
        self.intents.insert(intent.name.clone(), intent)
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalIntent> {
        self.intents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.intents.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.intents.keys()
    }

    pub fn intents(&self) -> impl Iterator<Item = &CanonicalIntent> {
        self.intents.values()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn mismatch_count(&self) -> usize {
        self.intents.values().map(|i| i.type_mismatches.len()).sum()
    }
}

impl FromIterator<CanonicalIntent> for CanonicalModel {
    fn from_iter<T: IntoIterator<Item = CanonicalIntent>>(iter: T) -> Self {
        let mut model = CanonicalModel::new();
        for intent in iter {
            model.insert(intent);
        }
        model
    }
}
