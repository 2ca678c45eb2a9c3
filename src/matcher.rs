use crate::config::{AuditConfig, LocaleProbe};
use crate::ingestion::{DocumentSet, LoadedDocument};
use crate::report::TableMatchRow;
use crate::schema::CanonicalIntent;
use crate::table::{ReferenceTable, TableRecord};
use crate::utils::{display_value, values_equal};
use log::debug;

/// Checks every table row against every present document, in table row
/// order and then document slot order.
pub fn match_table(
    table: &ReferenceTable,
    documents: &DocumentSet,
    config: &AuditConfig,
) -> Vec<TableMatchRow> {
    let records = table.records(&config.columns);
    let mut rows = Vec::with_capacity(records.len() * 4);

    for record in &records {
        if record.name.is_none() {
            debug!("Table row without an intent name; it cannot match any document");
        }
        for document in documents.present() {
            rows.push(match_record(record, document, config));
        }
    }

    rows
}

fn match_record(
    record: &TableRecord,
    document: &LoadedDocument,
    config: &AuditConfig,
) -> TableMatchRow {
    let intent = record
        .name
        .as_deref()
        .and_then(|name| document.model.get(name));

    let document_priority = intent.and_then(|i| i.priority.clone());
    // A blank table priority never matches, even a document without one.
    let priority_matches = intent.is_some()
        && record.priority.is_some()
        && values_equal(&record.priority, &document_priority);

    let comment = match intent {
        None => "name not found in document".to_string(),
        Some(intent) => {
            let mut parts = Vec::new();
            if priority_matches {
                parts.push("priority matches".to_string());
            } else {
                parts.push(format!(
                    "priority: table={} != document={}",
                    display_value(&record.priority),
                    display_value(&document_priority)
                ));
            }
            parts.extend(locale_note(
                &config.primary_locale,
                record.primary_phrase.as_deref(),
                &document.label,
                intent,
            ));
            parts.extend(locale_note(
                &config.secondary_locale,
                record.secondary_phrase.as_deref(),
                &document.label,
                intent,
            ));
            parts.join("; ")
        }
    };

    TableMatchRow {
        name: record.name.clone(),
        table_priority: record.priority.clone(),
        document_priority,
        priority_matches,
        document: document.label.clone(),
        kind: record.kind.clone(),
        primary_phrase: record.primary_phrase.clone(),
        secondary_phrase: record.secondary_phrase.clone(),
        comment,
    }
}

fn locale_note(
    probe: &LocaleProbe,
    phrase: Option<&str>,
    document_label: &str,
    intent: &CanonicalIntent,
) -> Option<String> {
    let phrase = phrase?;
    if !probe.applies_to(document_label) {
        return None;
    }
    if intent.contains_phrase(phrase) {
        Some(format!("{} found", probe.tag))
    } else {
        Some(format!("{} missing", probe.tag))
    }
}
