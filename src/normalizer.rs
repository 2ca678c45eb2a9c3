//! Turns loosely structured intent documents into a [`CanonicalModel`].
//!
//! Intent exports come in a handful of layouts. Each layout is a
//! [`DocumentShape`]; shapes are tried in [`DocumentShape::DETECTION_ORDER`]
//! and the first one that applies produces the model.

use crate::classifier::check_declared;
use crate::schema::{CanonicalIntent, CanonicalModel, TypeMismatch};
use crate::utils::{non_empty_text, present, scalar_text};
use log::debug;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// `{"intents": {"key": {"name": .., "samples": [{"text", "type"}]}}}`
    IntentMap,
    /// `{"intents": [{"name"|"id"|"title": .., "samples": [..]}]}`
    IntentList,
    /// `{"anything": {"name": .., "samples": [..]}, ...}`
    NestedSamples,
    /// `[{"name": .., "samples": [{"text", "type"}]}]`
    BareList,
}

/// How samples inside an intent object are read.
#[derive(Debug, Clone, Copy)]
struct SampleRules {
    accept_scalars: bool,
    structured_default: &'static str,
    scalar_default: &'static str,
}

const LENIENT: SampleRules = SampleRules {
    accept_scalars: true,
    structured_default: "unknown",
    scalar_default: "example",
};

const STRUCTURED_ONLY: SampleRules = SampleRules {
    accept_scalars: false,
    structured_default: "unknown",
    scalar_default: "example",
};

const NAME_FIELDS: [&str; 3] = ["name", "id", "title"];

impl DocumentShape {
    pub const DETECTION_ORDER: [DocumentShape; 4] = [
        DocumentShape::IntentMap,
        DocumentShape::IntentList,
        DocumentShape::NestedSamples,
        DocumentShape::BareList,
    ];

    /// Returns `None` when the document does not have this shape.
    pub fn extract(&self, document: &Value) -> Option<CanonicalModel> {
        match self {
            DocumentShape::IntentMap => document
                .get("intents")
                .and_then(Value::as_object)
                .map(extract_intent_map),
            DocumentShape::IntentList => document
                .get("intents")
                .and_then(Value::as_array)
                .map(|items| extract_intent_list(items.iter(), LENIENT)),
            DocumentShape::NestedSamples => document.as_object().map(|fields| {
                extract_intent_list(
                    fields.values().filter(|v| v.get("samples").is_some_and(is_truthy)),
                    LENIENT,
                )
            }),
            DocumentShape::BareList => document
                .as_array()
                .map(|items| extract_intent_list(items.iter(), STRUCTURED_ONLY)),
        }
    }
}

/// Detects which shape applies to a document, if any.
pub fn detect_shape(document: &Value) -> Option<DocumentShape> {
    DocumentShape::DETECTION_ORDER
        .into_iter()
        .find(|shape| shape.extract(document).is_some())
}

/// Normalizes a document. Never fails: documents that match no shape, and
/// empty or null documents, produce an empty model.
pub fn normalize(document: &Value) -> CanonicalModel {
    if is_empty_document(document) {
        return CanonicalModel::new();
    }

    for shape in DocumentShape::DETECTION_ORDER {
        if let Some(model) = shape.extract(document) {
            debug!(
                "Normalized document as {:?}: {} intents, {} type mismatches",
                shape,
                model.len(),
                model.mismatch_count()
            );
            return model;
        }
    }

    debug!("Document matched no known intent layout");
    CanonicalModel::new()
}

fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn samples_of(item: &Map<String, Value>) -> &[Value] {
    item.get("samples")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn declared_type(sample: &Map<String, Value>, default: &str) -> String {
    sample
        .get("type")
        .and_then(scalar_text)
        .unwrap_or_else(|| default.to_string())
}

fn extract_intent_map(intents: &Map<String, Value>) -> CanonicalModel {
    let mut model = CanonicalModel::new();

    for (key, item) in intents {
        let Some(item) = item.as_object() else {
            continue;
        };
        let name = item
            .get("name")
            .and_then(non_empty_text)
            .unwrap_or_else(|| key.clone());
        if name.is_empty() {
            debug!("Skipping intent with an empty key and no name");
            continue;
        }

        let mut intent = CanonicalIntent::new(name, present(item.get("priority")));
        for sample in samples_of(item).iter().filter_map(Value::as_object) {
            let Some(text) = sample.get("text").and_then(scalar_text) else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let declared = declared_type(sample, "unknown");
            if let Some(expected) = check_declared(text, &declared) {
                intent.type_mismatches.push(TypeMismatch {
                    text: text.to_string(),
                    declared: declared.clone(),
                    expected,
                });
            }
            intent.add_sample(text, declared);
        }
        model.insert(intent);
    }

    model
}

fn extract_intent_list<'a>(
    items: impl Iterator<Item = &'a Value>,
    rules: SampleRules,
) -> CanonicalModel {
    let mut model = CanonicalModel::new();

    for item in items.filter_map(Value::as_object) {
        let Some(name) = NAME_FIELDS
            .iter()
            .find_map(|field| item.get(*field).and_then(non_empty_text))
        else {
            debug!("Skipping intent without name, id or title");
            continue;
        };

        let mut intent = CanonicalIntent::new(name, present(item.get("priority")));
        for sample in samples_of(item) {
            match sample {
                Value::Object(fields) => {
                    if let Some(text) = fields.get("text").and_then(scalar_text) {
                        intent.add_sample(&text, declared_type(fields, rules.structured_default));
                    }
                }
                other if rules.accept_scalars => {
                    if let Some(text) = scalar_text(other) {
                        intent.add_sample(&text, rules.scalar_default);
                    }
                }
                _ => {}
            }
        }
        model.insert(intent);
    }

    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SampleKind;
    use serde_json::json;

    #[test]
    fn test_intent_map_shape() {
        let doc = json!({
            "intents": {
                "k1": {
                    "name": "greet",
                    "priority": 3,
                    "samples": [
                        {"text": " Hello ", "type": "example"},
                        {"text": "hi|hey", "type": "example"},
                        {"text": "", "type": "regex"},
                        "bare strings are ignored here"
                    ]
                },
                "fallback_key": {"samples": [{"text": "book *", "type": "template"}]},
                "broken": 42
            }
        });

        assert_eq!(detect_shape(&doc), Some(DocumentShape::IntentMap));
        let model = normalize(&doc);
        assert_eq!(model.len(), 2);

        let greet = model.get("greet").unwrap();
        assert_eq!(greet.priority, Some(json!(3)));
        assert_eq!(greet.phrase_count(), 2);
        assert!(greet.phrases.contains("hello"));
        assert_eq!(greet.type_mismatches.len(), 1);
        assert_eq!(greet.type_mismatches[0].text, "hi|hey");
        assert_eq!(greet.type_mismatches[0].declared, "example");
        assert_eq!(greet.type_mismatches[0].expected, SampleKind::Regex);

        let fallback = model.get("fallback_key").unwrap();
        assert_eq!(fallback.priority, None);
        assert!(fallback.type_mismatches.is_empty());
    }

    #[test]
    fn test_intent_map_missing_type_is_a_mismatch() {
        let doc = json!({"intents": {"a": {"samples": [{"text": "plain"}]}}});
        let model = normalize(&doc);
        let intent = model.get("a").unwrap();
        assert_eq!(intent.phrase_types.get("plain").map(String::as_str), Some("unknown"));
        assert_eq!(intent.type_mismatches[0].expected, SampleKind::Example);
    }

    #[test]
    fn test_intent_list_shape_dedups_scalars() {
        let doc = json!({"intents": [{"name": "x", "samples": ["a", "a", " A "]}]});

        assert_eq!(detect_shape(&doc), Some(DocumentShape::IntentList));
        let model = normalize(&doc);
        let x = model.get("x").unwrap();
        assert_eq!(x.phrases.iter().cloned().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(x.phrase_types.get("a").map(String::as_str), Some("example"));
        assert!(x.type_mismatches.is_empty());
    }

    #[test]
    fn test_intent_list_name_resolution() {
        let doc = json!({"intents": [
            {"id": "by_id", "samples": [{"text": "One"}]},
            {"name": "", "title": "by_title", "samples": []},
            {"samples": [{"text": "orphan"}]},
            {"name": "dup", "priority": 1},
            {"name": "dup", "priority": 2}
        ]});

        let model = normalize(&doc);
        assert_eq!(
            model.names().cloned().collect::<Vec<_>>(),
            vec!["by_id", "by_title", "dup"]
        );
        assert_eq!(
            model.get("by_id").unwrap().phrase_types.get("one").map(String::as_str),
            Some("unknown")
        );
        assert_eq!(model.get("dup").unwrap().priority, Some(json!(2)));
    }

    #[test]
    fn test_bare_list_shape_ignores_scalar_samples() {
        let doc = json!([
            {"name": "x", "samples": ["a", {"text": "B", "type": "regex"}]},
            "not an intent"
        ]);

        assert_eq!(detect_shape(&doc), Some(DocumentShape::BareList));
        let model = normalize(&doc);
        let x = model.get("x").unwrap();
        assert_eq!(x.phrase_count(), 1);
        assert!(x.phrases.contains("b"));
    }

    #[test]
    fn test_nested_samples_shape() {
        let doc = json!({
            "meta": {"version": 2},
            "first": {"title": "order", "priority": "high", "samples": ["Buy", "buy "]},
            "empty": {"name": "skipped", "samples": []}
        });

        assert_eq!(detect_shape(&doc), Some(DocumentShape::NestedSamples));
        let model = normalize(&doc);
        assert_eq!(model.len(), 1);
        let order = model.get("order").unwrap();
        assert_eq!(order.priority, Some(json!("high")));
        assert_eq!(order.phrase_count(), 1);
    }

    #[test]
    fn test_unusable_intents_field_falls_through() {
        let doc = json!({
            "intents": "not a collection",
            "x": {"name": "x", "samples": ["one"]}
        });
        let model = normalize(&doc);
        assert!(model.contains("x"));
    }

    #[test]
    fn test_empty_documents() {
        assert!(normalize(&Value::Null).is_empty());
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!([])).is_empty());
        assert!(normalize(&json!("text")).is_empty());
        assert_eq!(detect_shape(&json!(7)), None);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let doc = json!({"intents": {"b": {"samples": [{"text": "Z"}, {"text": "a?"}]}, "a": {}}});
        assert_eq!(normalize(&doc), normalize(&doc));
    }
}
