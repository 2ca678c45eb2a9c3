use crate::error::{IntentAuditError, Result};
use crate::utils::normalize_phrase;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header aliases per logical table column, matched case-insensitively after
/// trimming. Earlier aliases win when several headers match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ColumnAliases {
    #[schemars(description = "Headers that hold the intent name")]
    pub name: Vec<String>,

    #[schemars(description = "Headers that hold the expected priority")]
    pub priority: Vec<String>,

    #[schemars(description = "Headers that hold the kind tag (e.g. the shared marker)")]
    pub kind: Vec<String>,

    #[schemars(description = "Headers that hold the primary-locale reference phrase")]
    pub primary_phrase: Vec<String>,

    #[schemars(description = "Headers that hold the secondary-locale reference phrase")]
    pub secondary_phrase: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            name: list(&["Название", "name"]),
            priority: list(&["Приоритет", "priority"]),
            kind: list(&["Вид", "type", "kind"]),
            primary_phrase: list(&["RU"]),
            secondary_phrase: list(&["KZ"]),
        }
    }
}

/// A locale whose reference phrase is checked against documents whose label
/// contains `marker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocaleProbe {
    #[schemars(description = "Substring looked for (case-insensitively) in the document label")]
    pub marker: String,

    #[schemars(description = "Tag used in report comments, e.g. 'RU'")]
    pub tag: String,
}

impl LocaleProbe {
    pub fn new(marker: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            tag: tag.into(),
        }
    }

    pub fn applies_to(&self, document_label: &str) -> bool {
        !self.marker.is_empty()
            && document_label
                .to_lowercase()
                .contains(&self.marker.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AuditConfig {
    #[schemars(
        description = "Kind-column value marking intents shared across documents. Rows with this value drive the restricted 1-vs-3 and 4-vs-2 comparisons."
    )]
    pub shared_marker: String,

    #[schemars(description = "How many added/removed phrases are shown per diff row")]
    pub preview_limit: usize,

    pub columns: ColumnAliases,

    pub primary_locale: LocaleProbe,

    pub secondary_locale: LocaleProbe,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            shared_marker: "общий".to_string(),
            preview_limit: 10,
            columns: ColumnAliases::default(),
            primary_locale: LocaleProbe::new("ru", "RU"),
            secondary_locale: LocaleProbe::new("kz", "KZ"),
        }
    }
}

impl AuditConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AuditConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.preview_limit == 0 {
            return Err(IntentAuditError::InvalidConfig(
                "preview_limit must be at least 1".to_string(),
            ));
        }
        if normalize_phrase(&self.shared_marker).is_empty() {
            return Err(IntentAuditError::InvalidConfig(
                "shared_marker must not be blank".to_string(),
            ));
        }
        if self.columns.name.is_empty() {
            return Err(IntentAuditError::InvalidConfig(
                "at least one alias is required for the name column".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a kind-column cell carries the shared marker.
    pub fn is_shared_kind(&self, kind: &str) -> bool {
        normalize_phrase(kind) == normalize_phrase(&self.shared_marker)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AuditConfig)
    }
}
