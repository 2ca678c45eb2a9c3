use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The sample type a phrase is expected to carry, judged from its text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    #[schemars(description = "Pattern with alternation or optional parts (contains '|' or '?')")]
    Regex,

    #[schemars(description = "Wildcard template (contains '*')")]
    Template,

    #[schemars(description = "Plain example utterance")]
    Example,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Regex => "regex",
            SampleKind::Template => "template",
            SampleKind::Example => "example",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guesses the sample type from the phrase text. This is a heuristic: the
/// syntax of regexes and templates is not checked.
pub fn classify(text: &str) -> SampleKind {
    if text.contains('|') || text.contains('?') {
        SampleKind::Regex
    } else if text.contains('*') {
        SampleKind::Template
    } else {
        SampleKind::Example
    }
}

/// Returns the expected kind if it disagrees with the declared type tag.
pub fn check_declared(text: &str, declared: &str) -> Option<SampleKind> {
    let expected = classify(text);
    (expected.as_str() != declared).then_some(expected)
}
