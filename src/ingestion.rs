use crate::error::{IntentAuditError, Result};
use crate::normalizer::normalize;
use crate::schema::CanonicalModel;
use log::{debug, info};
use serde_json::Value;
use std::path::Path;

/// The four document positions of a comparison request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentSlot {
    One,
    Two,
    Three,
    Four,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::One,
        DocumentSlot::Two,
        DocumentSlot::Three,
        DocumentSlot::Four,
    ];

    pub fn index(&self) -> usize {
        match self {
            DocumentSlot::One => 0,
            DocumentSlot::Two => 1,
            DocumentSlot::Three => 2,
            DocumentSlot::Four => 3,
        }
    }

    pub fn number(&self) -> usize {
        self.index() + 1
    }

    /// Identifier used when the upload carries no file name.
    pub fn default_label(&self) -> String {
        format!("JSON{}", self.number())
    }
}

/// Raw bytes of an uploaded intent document and the name it was uploaded under.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpload {
    pub label: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { label, bytes })
    }
}

/// Decodes an upload as JSON. An empty upload is an absent document and
/// decodes to `null`; anything else that is not valid JSON is an error.
pub fn parse_document(upload: &DocumentUpload) -> Result<Value> {
    let bytes = upload
        .bytes
        .strip_prefix("\u{feff}".as_bytes())
        .unwrap_or(upload.bytes.as_slice());
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|source| IntentAuditError::DocumentParse {
        document: upload.label.clone(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub slot: DocumentSlot,
    pub label: String,
    pub model: CanonicalModel,
}

/// Up to four normalized documents. A slot whose model has no intents is
/// treated as absent everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    documents: [Option<LoadedDocument>; 4],
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: DocumentSlot, label: impl Into<String>, model: CanonicalModel) {
        let label = label.into();
        let label = if label.trim().is_empty() {
            slot.default_label()
        } else {
            label
        };
        self.documents[slot.index()] = Some(LoadedDocument { slot, label, model });
    }

    pub fn with(mut self, slot: DocumentSlot, label: impl Into<String>, model: CanonicalModel) -> Self {
        self.insert(slot, label, model);
        self
    }

    /// Parses and normalizes each upload. The first unparsable document
    /// aborts the whole set.
    pub fn from_uploads<I>(uploads: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocumentSlot, DocumentUpload)>,
    {
        let mut set = Self::new();
        for (slot, upload) in uploads {
            let document = parse_document(&upload)?;
            let model = normalize(&document);
            debug!(
                "Document {} ('{}') normalized to {} intents",
                slot.number(),
                upload.label,
                model.len()
            );
            set.insert(slot, upload.label, model);
        }
        info!("Loaded {} non-empty documents", set.present().count());
        Ok(set)
    }

    /// The document in `slot`, if it contributed at least one intent.
    pub fn get(&self, slot: DocumentSlot) -> Option<&LoadedDocument> {
        self.documents[slot.index()]
            .as_ref()
            .filter(|doc| !doc.model.is_empty())
    }

    pub fn is_present(&self, slot: DocumentSlot) -> bool {
        self.get(slot).is_some()
    }

    /// Present documents in slot order.
    pub fn present(&self) -> impl Iterator<Item = &LoadedDocument> {
        DocumentSlot::ALL.into_iter().filter_map(move |slot| self.get(slot))
    }

    pub fn labels(&self) -> Vec<String> {
        self.present().map(|doc| doc.label.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_upload_is_null() {
        let upload = DocumentUpload::new("a.json", Vec::new());
        assert_eq!(parse_document(&upload).unwrap(), Value::Null);
        let blank = DocumentUpload::new("b.json", "  \n");
        assert_eq!(parse_document(&blank).unwrap(), Value::Null);
    }

    #[test]
    fn test_bom_is_skipped() {
        let upload = DocumentUpload::new("bom.json", "\u{feff}{\"intents\": []}");
        assert!(parse_document(&upload).unwrap().is_object());
    }

    #[test]
    fn test_malformed_upload_names_the_document() {
        let upload = DocumentUpload::new("broken.json", "{\"intents\": ");
        match parse_document(&upload) {
            Err(IntentAuditError::DocumentParse { document, .. }) => {
                assert_eq!(document, "broken.json")
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_set_labels_and_presence() {
        let set = DocumentSet::from_uploads(vec![
            (
                DocumentSlot::One,
                DocumentUpload::new("", r#"{"intents": {"a": {}}}"#),
            ),
            (
                DocumentSlot::Three,
                DocumentUpload::new("three_kz.json", r#"{"intents": []}"#),
            ),
            (
                DocumentSlot::Four,
                DocumentUpload::new("four.json", r#"[{"name": "z"}]"#),
            ),
        ])
        .unwrap();

        assert!(set.is_present(DocumentSlot::One));
        assert!(!set.is_present(DocumentSlot::Two));
        assert!(!set.is_present(DocumentSlot::Three));
        assert_eq!(set.labels(), vec!["JSON1", "four.json"]);
    }

    #[test]
    fn test_from_uploads_stops_on_bad_document() {
        let result = DocumentSet::from_uploads(vec![
            (DocumentSlot::One, DocumentUpload::new("ok.json", "{}")),
            (DocumentSlot::Two, DocumentUpload::new("bad.json", "nope")),
        ]);
        assert!(matches!(result, Err(IntentAuditError::DocumentParse { .. })));
    }
}
