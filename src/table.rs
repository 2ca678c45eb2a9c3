use crate::config::{AuditConfig, ColumnAliases};
use crate::error::{IntentAuditError, Result};
use crate::utils::{non_empty_text, normalize_phrase};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// A row-oriented table with named columns. CSV cells are kept as trimmed
/// text and blanks become null; only the priority field is read as a number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Column positions for each logical field, resolved once per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedColumns {
    pub name: Option<usize>,
    pub priority: Option<usize>,
    pub kind: Option<usize>,
    pub primary_phrase: Option<usize>,
    pub secondary_phrase: Option<usize>,
}

/// The logical view of one table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRecord {
    pub name: Option<String>,
    pub priority: Option<Value>,
    pub kind: Option<String>,
    pub primary_phrase: Option<String>,
    pub secondary_phrase: Option<String>,
}

impl ReferenceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| IntentAuditError::TableLoad(format!("unreadable header row: {}", e)))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(IntentAuditError::TableLoad(
                "the table has no header row".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| {
                IntentAuditError::TableLoad(format!("row {} could not be read: {}", idx + 1, e))
            })?;
            let mut row: Vec<Value> = record.iter().map(parse_cell).collect();
            row.resize(headers.len(), Value::Null);
            rows.push(row);
        }

        debug!(
            "Loaded reference table with {} columns and {} rows",
            headers.len(),
            rows.len()
        );

        Ok(Self { headers, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_csv_reader(bytes)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            IntentAuditError::TableLoad(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_csv_reader(file)
    }

    pub fn resolve_columns(&self, aliases: &ColumnAliases) -> ResolvedColumns {
        let find = |field: &str, candidates: &[String]| {
            let position = candidates.iter().find_map(|alias| {
                let alias = normalize_phrase(alias);
                self.headers
                    .iter()
                    .position(|header| normalize_phrase(header) == alias)
            });
            if position.is_none() {
                debug!("No header found for the {} column (tried {:?})", field, candidates);
            }
            position
        };

        ResolvedColumns {
            name: find("name", aliases.name.as_slice()),
            priority: find("priority", aliases.priority.as_slice()),
            kind: find("kind", aliases.kind.as_slice()),
            primary_phrase: find("primary phrase", aliases.primary_phrase.as_slice()),
            secondary_phrase: find("secondary phrase", aliases.secondary_phrase.as_slice()),
        }
    }

    /// Logical records for every row. Unresolved columns yield empty fields.
    pub fn records(&self, aliases: &ColumnAliases) -> Vec<TableRecord> {
        let columns = self.resolve_columns(aliases);
        self.rows
            .iter()
            .map(|row| {
                let cell = |idx: Option<usize>| {
                    idx.and_then(|i| row.get(i)).filter(|v| !v.is_null())
                };
                TableRecord {
                    name: cell(columns.name).and_then(non_empty_text),
                    priority: cell(columns.priority).map(typed_priority),
                    kind: cell(columns.kind).and_then(non_empty_text),
                    primary_phrase: cell(columns.primary_phrase).and_then(non_empty_text),
                    secondary_phrase: cell(columns.secondary_phrase).and_then(non_empty_text),
                }
            })
            .collect()
    }

    /// Names of rows whose kind column carries the shared marker.
    pub fn shared_names(&self, config: &AuditConfig) -> BTreeSet<String> {
        self.records(&config.columns)
            .into_iter()
            .filter(|r| r.kind.as_deref().is_some_and(|k| config.is_shared_kind(k)))
            .filter_map(|r| r.name)
            .collect()
    }
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// Numeric-looking priorities become numbers, the way spreadsheet loaders
/// type them. Other cells keep their text as written.
fn typed_priority(cell: &Value) -> Value {
    let Value::String(text) = cell else {
        return cell.clone();
    };
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => cell.clone(),
    }
}

/// Where the reference table comes from.
#[derive(Debug, Clone)]
pub enum TableSource {
    Bytes(Vec<u8>),
    File(PathBuf),
    Missing,
}

impl TableSource {
    pub fn load(&self) -> Result<ReferenceTable> {
        match self {
            TableSource::Bytes(bytes) if !bytes.is_empty() => ReferenceTable::from_csv_bytes(bytes),
            TableSource::File(path) => ReferenceTable::from_csv_path(path),
            TableSource::Bytes(_) | TableSource::Missing => Err(IntentAuditError::TableLoad(
                "no table uploaded and no link given".to_string(),
            )),
        }
    }
}

/// Rewrites a Google Sheets edit link into a CSV export link. Export links
/// and unrecognised URLs are returned trimmed but otherwise unchanged.
pub fn spreadsheet_export_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("export?format=") || url.contains("output=") {
        return url.replacen("?format=csv?", "?format=csv&", 1);
    }

    let Some((_, rest)) = url.split_once("/d/") else {
        return url.to_string();
    };
    let sheet_id = rest.split('/').next().unwrap_or_default();
    if sheet_id.is_empty() {
        return url.to_string();
    }

    let gid = url
        .split_once("gid=")
        .map(|(_, tail)| tail.split(['&', '#']).next().unwrap_or_default())
        .filter(|gid| !gid.is_empty());

    match gid {
        Some(gid) => format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            sheet_id, gid
        ),
        None => format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            sheet_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = "\u{feff}Название,PRIORITY,Вид,RU,KZ\n\
                       greet,1,Общий,Привет,Сәлем\n\
                       bye,2.5,частный,,\n\
                       ,3,общий,x,\n";

    #[test]
    fn test_csv_cells_are_typed() {
        let table = ReferenceTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.headers()[0], "Название");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0][1], json!("1"));
        assert_eq!(table.rows()[1][3], Value::Null);
        assert_eq!(table.rows()[0][3], json!("Привет"));

        let records = table.records(&ColumnAliases::default());
        assert_eq!(records[0].priority, Some(json!(1)));
        assert_eq!(records[1].priority, Some(json!(2.5)));
    }

    #[test]
    fn test_numeric_looking_names_keep_their_text() {
        let table = ReferenceTable::from_csv_bytes(
            b"name,priority,kind,RU\n007,01,0042,1.50\n1.50,high,,\n",
        )
        .unwrap();
        let records = table.records(&ColumnAliases::default());

        assert_eq!(records[0].name.as_deref(), Some("007"));
        assert_eq!(records[0].priority, Some(json!(1)));
        assert_eq!(records[0].kind.as_deref(), Some("0042"));
        assert_eq!(records[0].primary_phrase.as_deref(), Some("1.50"));
        assert_eq!(records[1].name.as_deref(), Some("1.50"));
        assert_eq!(records[1].priority, Some(json!("high")));
    }

    #[test]
    fn test_columns_resolved_case_insensitively() {
        let table = ReferenceTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        let columns = table.resolve_columns(&ColumnAliases::default());
        assert_eq!(columns.name, Some(0));
        assert_eq!(columns.priority, Some(1));
        assert_eq!(columns.kind, Some(2));
        assert_eq!(columns.primary_phrase, Some(3));
        assert_eq!(columns.secondary_phrase, Some(4));
    }

    #[test]
    fn test_unresolved_columns_yield_empty_fields() {
        let table = ReferenceTable::new(
            vec!["intent".to_string(), "Priority".to_string()],
            vec![vec![json!("greet"), json!(1)]],
        );
        let records = table.records(&ColumnAliases::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, None);
        assert_eq!(records[0].priority, Some(json!(1)));
        assert_eq!(records[0].kind, None);
    }

    #[test]
    fn test_shared_names() {
        let table = ReferenceTable::from_csv_bytes(CSV.as_bytes()).unwrap();
        let names = table.shared_names(&AuditConfig::default());
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["greet"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = ReferenceTable::from_csv_bytes(b"name,priority,kind\nonly\n").unwrap();
        assert_eq!(table.rows()[0], vec![json!("only"), Value::Null, Value::Null]);
    }

    #[test]
    fn test_missing_table_is_a_load_error() {
        assert!(matches!(
            TableSource::Missing.load(),
            Err(IntentAuditError::TableLoad(_))
        ));
        assert!(matches!(
            TableSource::Bytes(Vec::new()).load(),
            Err(IntentAuditError::TableLoad(_))
        ));
        assert!(matches!(
            TableSource::File(PathBuf::from("/definitely/not/here.csv")).load(),
            Err(IntentAuditError::TableLoad(_))
        ));
    }

    #[test]
    fn test_spreadsheet_export_url() {
        assert_eq!(
            spreadsheet_export_url("https://docs.google.com/spreadsheets/d/abc123/edit#gid=42"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=42"
        );
        assert_eq!(
            spreadsheet_export_url(" https://docs.google.com/spreadsheets/d/abc123/edit "),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
        assert_eq!(
            spreadsheet_export_url("https://docs.google.com/spreadsheets/d/abc/export?format=csv?gid=1"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=1"
        );
        assert_eq!(spreadsheet_export_url("https://example.com/t.csv"), "https://example.com/t.csv");
    }
}
