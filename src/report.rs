//! Report tables produced by a comparison run, and their renderings.
//!
//! A [`ComparisonReport`] is returned by value from every build. Callers that
//! want to keep "the last report" around (for a later download, say) can park
//! it in a [`LastReport`], which is a plain replace-on-write slot.

use crate::classifier::SampleKind;
use crate::error::Result;
use crate::utils::display_value;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    #[schemars(description = "Compare documents 1 and 2 (both required)")]
    Pair2,

    #[schemars(
        description = "Compare 1 vs 2, 3 vs 4, and 1 vs 3 / 4 vs 2 restricted to shared intents; missing documents skip their comparison"
    )]
    Pair4,
}

impl FromStr for ComparisonMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pair2" | "compare_2" | "2" => Ok(ComparisonMode::Pair2),
            "pair4" | "compare_4" | "4" => Ok(ComparisonMode::Pair4),
            other => Err(format!("unknown comparison mode '{}'", other)),
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::Pair2 => f.write_str("pair2"),
            ComparisonMode::Pair4 => f.write_str("pair4"),
        }
    }
}

/// Position of a table in the report. Declaration order is output order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonSlot {
    TableVsDocuments,
    Doc1VsDoc2,
    Doc3VsDoc4,
    Doc1VsDoc3Shared,
    Doc4VsDoc2Shared,
    TypeMismatches,
}

impl ComparisonSlot {
    pub const ALL: [ComparisonSlot; 6] = [
        ComparisonSlot::TableVsDocuments,
        ComparisonSlot::Doc1VsDoc2,
        ComparisonSlot::Doc3VsDoc4,
        ComparisonSlot::Doc1VsDoc3Shared,
        ComparisonSlot::Doc4VsDoc2Shared,
        ComparisonSlot::TypeMismatches,
    ];

    /// The sheet (file) name used when the report is exported.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            ComparisonSlot::TableVsDocuments => "Table_vs_Documents",
            ComparisonSlot::Doc1VsDoc2 => "Doc1_vs_Doc2",
            ComparisonSlot::Doc3VsDoc4 => "Doc3_vs_Doc4",
            ComparisonSlot::Doc1VsDoc3Shared => "Doc1_vs_Doc3_shared",
            ComparisonSlot::Doc4VsDoc2Shared => "Doc4_vs_Doc2_shared",
            ComparisonSlot::TypeMismatches => "Type_Mismatches",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ComparisonSlot::TableVsDocuments => "Table vs documents",
            ComparisonSlot::Doc1VsDoc2 => "Document 1 vs document 2",
            ComparisonSlot::Doc3VsDoc4 => "Document 3 vs document 4",
            ComparisonSlot::Doc1VsDoc3Shared => "Document 1 vs document 3 (shared intents)",
            ComparisonSlot::Doc4VsDoc2Shared => "Document 4 vs document 2 (shared intents)",
            ComparisonSlot::TypeMismatches => "Sample type mismatches",
        }
    }
}

/// One (table row, document) pair from the table-vs-documents check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableMatchRow {
    pub name: Option<String>,
    pub table_priority: Option<Value>,
    pub document_priority: Option<Value>,
    pub priority_matches: bool,
    #[schemars(description = "Display label of the document this row was checked against")]
    pub document: String,
    pub kind: Option<String>,
    pub primary_phrase: Option<String>,
    pub secondary_phrase: Option<String>,
    pub comment: String,
}

/// One intent name from a document-vs-document diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PairDiffRow {
    pub name: String,
    pub priority_a: Option<Value>,
    pub priority_b: Option<Value>,
    pub phrase_count_a: usize,
    pub phrase_count_b: usize,
    #[schemars(description = "Phrases present in B but not in A, sorted")]
    pub added: Vec<String>,
    #[schemars(description = "Phrases present in A but not in B, sorted")]
    pub removed: Vec<String>,
    pub added_preview: String,
    pub removed_preview: String,
    pub fully_equal: bool,
    pub label_a: String,
    pub label_b: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeMismatchRow {
    pub document: String,
    pub intent: String,
    pub text: String,
    pub declared: String,
    pub expected: SampleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ReportRows {
    TableMatch(Vec<TableMatchRow>),
    PairDiff(Vec<PairDiffRow>),
    TypeMismatch(Vec<TypeMismatchRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportTable {
    pub slot: ComparisonSlot,
    pub name: String,
    pub rows: ReportRows,
}

fn flag(value: bool) -> String {
    let mark = if value { "✅" } else { "❌" };
    mark.to_string()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn cell(value: &Option<Value>) -> String {
    match value {
        None => String::new(),
        some => display_value(some),
    }
}

impl ReportTable {
    pub fn new(slot: ComparisonSlot, rows: ReportRows) -> Self {
        Self {
            slot,
            name: slot.sheet_name().to_string(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        match &self.rows {
            ReportRows::TableMatch(rows) => rows.len(),
            ReportRows::PairDiff(rows) => rows.len(),
            ReportRows::TypeMismatch(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn headers(&self) -> Vec<&'static str> {
        match &self.rows {
            ReportRows::TableMatch(_) => vec![
                "Name",
                "Priority (table)",
                "Priority (document)",
                "Priority matches",
                "Document",
                "Kind (table)",
                "Primary phrase (table)",
                "Secondary phrase (table)",
                "Comment",
            ],
            ReportRows::PairDiff(_) => vec![
                "Name",
                "Priority (A)",
                "Priority (B)",
                "Phrases (A)",
                "Phrases (B)",
                "Added",
                "Removed",
                "Fully equal",
                "File A",
                "File B",
                "Comment",
            ],
            ReportRows::TypeMismatch(_) => {
                vec!["Document", "Intent", "Text", "Declared type", "Expected type"]
            }
        }
    }

    /// Every row as display strings, in header order.
    pub fn records(&self) -> Vec<Vec<String>> {
        match &self.rows {
            ReportRows::TableMatch(rows) => rows
                .iter()
                .map(|r| {
                    vec![
                        text(&r.name),
                        cell(&r.table_priority),
                        cell(&r.document_priority),
                        flag(r.priority_matches),
                        r.document.clone(),
                        text(&r.kind),
                        text(&r.primary_phrase),
                        text(&r.secondary_phrase),
                        r.comment.clone(),
                    ]
                })
                .collect(),
            ReportRows::PairDiff(rows) => rows
                .iter()
                .map(|r| {
                    vec![
                        r.name.clone(),
                        cell(&r.priority_a),
                        cell(&r.priority_b),
                        r.phrase_count_a.to_string(),
                        r.phrase_count_b.to_string(),
                        r.added_preview.clone(),
                        r.removed_preview.clone(),
                        flag(r.fully_equal),
                        r.label_a.clone(),
                        r.label_b.clone(),
                        r.comment.clone(),
                    ]
                })
                .collect(),
            ReportRows::TypeMismatch(rows) => rows
                .iter()
                .map(|r| {
                    vec![
                        r.document.clone(),
                        r.intent.clone(),
                        r.text.clone(),
                        r.declared.clone(),
                        r.expected.to_string(),
                    ]
                })
                .collect(),
        }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.headers())?;
        for record in self.records() {
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Explains why a comparison slot produced no table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportNote {
    pub slot: ComparisonSlot,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonReport {
    pub mode: ComparisonMode,
    pub generated_at: DateTime<Utc>,
    #[schemars(description = "Labels of the documents that contributed at least one intent")]
    pub loaded_documents: Vec<String>,
    pub tables: Vec<ReportTable>,
    pub notes: Vec<ReportNote>,
}

impl ComparisonReport {
    pub fn new(mode: ComparisonMode, loaded_documents: Vec<String>) -> Self {
        Self {
            mode,
            generated_at: Utc::now(),
            loaded_documents,
            tables: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn table(&self, slot: ComparisonSlot) -> Option<&ReportTable> {
        self.tables.iter().find(|t| t.slot == slot)
    }

    pub fn notes_for(&self, slot: ComparisonSlot) -> impl Iterator<Item = &ReportNote> {
        self.notes.iter().filter(move |n| n.slot == slot)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ComparisonReport)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Intent comparison ({})\n\n", self.mode));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if self.loaded_documents.is_empty() {
            output.push_str("**Loaded documents:** none\n\n");
        } else {
            output.push_str(&format!(
                "**Loaded documents:** {}\n\n",
                self.loaded_documents.join(", ")
            ));
        }

        for slot in ComparisonSlot::ALL {
            if let Some(table) = self.table(slot) {
                output.push_str(&format!("## {}\n\n", slot.title()));
                push_markdown_table(&mut output, table);
                output.push('\n');
            }
            for note in self.notes_for(slot) {
                output.push_str(&format!("> {}\n\n", note.message));
            }
        }

        output
    }

    /// Writes one CSV file per table plus `Loaded_Documents.csv` into `dir`.
    /// Sheets left by an earlier report are removed first, so the directory
    /// only ever holds the latest report. Nothing guards against two
    /// runs writing into the same directory at once.
    pub fn write_csv_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        for name in ComparisonSlot::ALL
            .iter()
            .map(|slot| slot.sheet_name())
            .chain([LOADED_DOCUMENTS_SHEET])
        {
            let stale = dir.join(format!("{}.csv", name));
            if stale.exists() {
                std::fs::remove_file(&stale)?;
            }
        }

        let mut written = Vec::new();
        for table in &self.tables {
            let path = dir.join(format!("{}.csv", table.name));
            table.write_csv(&path)?;
            written.push(path);
        }

        let path = dir.join(format!("{}.csv", LOADED_DOCUMENTS_SHEET));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["Loaded document"])?;
        for label in &self.loaded_documents {
            writer.write_record([label])?;
        }
        writer.flush()?;
        written.push(path);

        log::info!("Wrote {} report files to {}", written.len(), dir.display());
        Ok(written)
    }
}

const LOADED_DOCUMENTS_SHEET: &str = "Loaded_Documents";

fn escape_markdown(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn push_markdown_table(output: &mut String, table: &ReportTable) {
    let headers = table.headers();
    output.push_str(&format!("| {} |\n", headers.join(" | ")));
    output.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
    for record in table.records() {
        let cells: Vec<String> = record.iter().map(|c| escape_markdown(c)).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
}

/// Holds the most recently built report. Storing a new report replaces the
/// previous one; readers get whichever report was stored last.
#[derive(Debug, Default)]
pub struct LastReport {
    slot: RwLock<Option<Arc<ComparisonReport>>>,
}

impl LastReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, report: ComparisonReport) -> Arc<ComparisonReport> {
        let report = Arc::new(report);
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&report));
        report
    }

    pub fn latest(&self) -> Option<Arc<ComparisonReport>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
