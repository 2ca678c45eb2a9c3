use crate::config::AuditConfig;
use crate::diff::PairDiffer;
use crate::error::{IntentAuditError, Result};
use crate::ingestion::{DocumentSet, DocumentSlot};
use crate::matcher::match_table;
use crate::report::{
    ComparisonMode, ComparisonReport, ComparisonSlot, ReportNote, ReportRows, ReportTable,
    TypeMismatchRow,
};
use crate::table::ReferenceTable;
use log::{debug, info};
use std::collections::BTreeSet;

/// A document-vs-document comparison the engine may run.
#[derive(Debug, Clone, Copy)]
struct PairPlan {
    slot: ComparisonSlot,
    left: DocumentSlot,
    right: DocumentSlot,
    shared_only: bool,
}

const PAIR2_PLAN: [PairPlan; 1] = [PairPlan {
    slot: ComparisonSlot::Doc1VsDoc2,
    left: DocumentSlot::One,
    right: DocumentSlot::Two,
    shared_only: false,
}];

const PAIR4_PLAN: [PairPlan; 4] = [
    PairPlan {
        slot: ComparisonSlot::Doc1VsDoc2,
        left: DocumentSlot::One,
        right: DocumentSlot::Two,
        shared_only: false,
    },
    PairPlan {
        slot: ComparisonSlot::Doc3VsDoc4,
        left: DocumentSlot::Three,
        right: DocumentSlot::Four,
        shared_only: false,
    },
    PairPlan {
        slot: ComparisonSlot::Doc1VsDoc3Shared,
        left: DocumentSlot::One,
        right: DocumentSlot::Three,
        shared_only: true,
    },
    PairPlan {
        slot: ComparisonSlot::Doc4VsDoc2Shared,
        left: DocumentSlot::Four,
        right: DocumentSlot::Two,
        shared_only: true,
    },
];

pub struct ComparisonEngine<'a> {
    config: &'a AuditConfig,
    differ: PairDiffer,
}

impl<'a> ComparisonEngine<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self {
            config,
            differ: PairDiffer::new(config.preview_limit),
        }
    }

    /// Builds the full report for one request. The table-vs-documents table
    /// always comes first; pairwise tables follow in plan order, and a
    /// type-mismatch table closes the report when any mismatches were found.
    pub fn build_report(
        &self,
        mode: ComparisonMode,
        documents: &DocumentSet,
        table: &ReferenceTable,
    ) -> Result<ComparisonReport> {
        if mode == ComparisonMode::Pair2
            && !(documents.is_present(DocumentSlot::One) && documents.is_present(DocumentSlot::Two))
        {
            return Err(IntentAuditError::MissingInput(
                "comparing two files needs both document 1 and document 2".to_string(),
            ));
        }

        info!(
            "Building {} report for {} documents and {} table rows",
            mode,
            documents.present().count(),
            table.len()
        );

        let mut report = ComparisonReport::new(mode, documents.labels());
        report.tables.push(ReportTable::new(
            ComparisonSlot::TableVsDocuments,
            ReportRows::TableMatch(match_table(table, documents, self.config)),
        ));

        let plan: &[PairPlan] = match mode {
            ComparisonMode::Pair2 => &PAIR2_PLAN,
            ComparisonMode::Pair4 => &PAIR4_PLAN,
        };

        let shared = if plan.iter().any(|p| p.shared_only) {
            let names = table.shared_names(self.config);
            if names.is_empty() {
                info!(
                    "No table rows have kind '{}'; shared comparisons will be skipped",
                    self.config.shared_marker
                );
            }
            names
        } else {
            BTreeSet::new()
        };

        for step in plan {
            self.run_pair(step, documents, &shared, &mut report);
        }

        if let Some(table) = mismatch_table(documents) {
            report.tables.push(table);
        }

        Ok(report)
    }

    fn run_pair(
        &self,
        step: &PairPlan,
        documents: &DocumentSet,
        shared: &BTreeSet<String>,
        report: &mut ComparisonReport,
    ) {
        let (Some(left), Some(right)) = (documents.get(step.left), documents.get(step.right))
        else {
            info!("Skipping {}: a document is missing", step.slot.sheet_name());
            report.notes.push(ReportNote {
                slot: step.slot,
                message: format!(
                    "Document {} or {} is missing; {} skipped.",
                    step.left.number(),
                    step.right.number(),
                    describe(step)
                ),
            });
            return;
        };

        if step.shared_only && shared.is_empty() {
            report.notes.push(ReportNote {
                slot: step.slot,
                message: format!(
                    "No table rows have kind '{}'; {} skipped.",
                    self.config.shared_marker,
                    describe(step)
                ),
            });
            return;
        }

        let restrict_to = step.shared_only.then_some(shared);
        let rows = self
            .differ
            .diff(&left.model, &right.model, &left.label, &right.label, restrict_to);
        debug!("{} produced {} rows", step.slot.sheet_name(), rows.len());
        report
            .tables
            .push(ReportTable::new(step.slot, ReportRows::PairDiff(rows)));
    }
}

fn describe(step: &PairPlan) -> String {
    format!(
        "comparison {} vs {}",
        step.left.number(),
        step.right.number()
    )
}

fn mismatch_table(documents: &DocumentSet) -> Option<ReportTable> {
    let rows: Vec<TypeMismatchRow> = documents
        .present()
        .flat_map(|doc| {
            doc.model.intents().flat_map(move |intent| {
                intent.type_mismatches.iter().map(move |m| TypeMismatchRow {
                    document: doc.label.clone(),
                    intent: intent.name.clone(),
                    text: m.text.clone(),
                    declared: m.declared.clone(),
                    expected: m.expected,
                })
            })
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(ReportTable::new(
            ComparisonSlot::TypeMismatches,
            ReportRows::TypeMismatch(rows),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CanonicalIntent, CanonicalModel};
    use serde_json::{json, Value};

    fn model(names: &[&str]) -> CanonicalModel {
        names
            .iter()
            .map(|n| {
                let mut intent = CanonicalIntent::new(*n, Some(json!(1)));
                intent.add_sample(n, "example");
                intent
            })
            .collect()
    }

    fn table(kinds: &[(&str, &str)]) -> ReferenceTable {
        ReferenceTable::new(
            vec!["name".to_string(), "priority".to_string(), "kind".to_string()],
            kinds
                .iter()
                .map(|(n, k)| vec![json!(n), json!(1), Value::String(k.to_string())])
                .collect(),
        )
    }

    #[test]
    fn test_pair2_requires_both_documents() {
        let config = AuditConfig::default();
        let engine = ComparisonEngine::new(&config);
        let docs = DocumentSet::new().with(DocumentSlot::One, "a", model(&["x"]));

        let err = engine
            .build_report(ComparisonMode::Pair2, &docs, &table(&[]))
            .unwrap_err();
        assert!(matches!(err, IntentAuditError::MissingInput(_)));
    }

    #[test]
    fn test_pair2_tables() {
        let config = AuditConfig::default();
        let engine = ComparisonEngine::new(&config);
        let docs = DocumentSet::new()
            .with(DocumentSlot::One, "a", model(&["x"]))
            .with(DocumentSlot::Two, "b", model(&["x", "y"]));

        let report = engine
            .build_report(ComparisonMode::Pair2, &docs, &table(&[("x", "общий")]))
            .unwrap();
        assert_eq!(report.table_names(), vec!["Table_vs_Documents", "Doc1_vs_Doc2"]);
        assert!(report.notes.is_empty());
        assert_eq!(report.table(ComparisonSlot::TableVsDocuments).unwrap().len(), 2);
    }

    #[test]
    fn test_pair4_skips_without_shared_rows() {
        let config = AuditConfig::default();
        let engine = ComparisonEngine::new(&config);
        let docs = DocumentSet::new()
            .with(DocumentSlot::One, "a", model(&["x"]))
            .with(DocumentSlot::Two, "b", model(&["x"]))
            .with(DocumentSlot::Three, "c", model(&["x"]))
            .with(DocumentSlot::Four, "d", model(&["x"]));

        let report = engine
            .build_report(ComparisonMode::Pair4, &docs, &table(&[("x", "частный")]))
            .unwrap();
        assert_eq!(
            report.table_names(),
            vec!["Table_vs_Documents", "Doc1_vs_Doc2", "Doc3_vs_Doc4"]
        );
        assert_eq!(report.notes_for(ComparisonSlot::Doc1VsDoc3Shared).count(), 1);
        assert_eq!(report.notes_for(ComparisonSlot::Doc4VsDoc2Shared).count(), 1);
    }

    #[test]
    fn test_pair4_restricted_and_missing() {
        let config = AuditConfig::default();
        let engine = ComparisonEngine::new(&config);
        let docs = DocumentSet::new()
            .with(DocumentSlot::One, "a", model(&["x", "y"]))
            .with(DocumentSlot::Three, "c", model(&["x", "z"]));

        let report = engine
            .build_report(ComparisonMode::Pair4, &docs, &table(&[("x", "Общий"), ("y", "")]))
            .unwrap();

        assert_eq!(
            report.table_names(),
            vec!["Table_vs_Documents", "Doc1_vs_Doc3_shared"]
        );
        let ReportRows::PairDiff(rows) = &report.table(ComparisonSlot::Doc1VsDoc3Shared).unwrap().rows
        else {
            panic!("expected a diff table");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "x");
        assert!(rows[0].fully_equal);

        assert_eq!(report.notes.len(), 3);
        assert!(report
            .notes_for(ComparisonSlot::Doc1VsDoc2)
            .all(|n| n.message.contains("missing")));
    }

    #[test]
    fn test_mismatch_table_is_last() {
        let config = AuditConfig::default();
        let engine = ComparisonEngine::new(&config);
        let mut intent = CanonicalIntent::new("x", None);
        intent.add_sample("a|b", "example");
        intent.type_mismatches.push(crate::schema::TypeMismatch {
            text: "a|b".to_string(),
            declared: "example".to_string(),
            expected: crate::classifier::SampleKind::Regex,
        });
        let docs = DocumentSet::new()
            .with(DocumentSlot::One, "a", vec![intent].into_iter().collect())
            .with(DocumentSlot::Two, "b", model(&["x"]));

        let report = engine
            .build_report(ComparisonMode::Pair2, &docs, &table(&[]))
            .unwrap();
        assert_eq!(report.tables.last().unwrap().slot, ComparisonSlot::TypeMismatches);
        assert_eq!(report.tables.last().unwrap().len(), 1);
    }
}
