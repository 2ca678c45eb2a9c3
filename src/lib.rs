//! # Intent Audit
//!
//! A library for reconciling conversational-agent intent exports. Up to four
//! intent documents are normalized into canonical models, compared with each
//! other, and checked against a tracking spreadsheet.
//!
//! ## Core Concepts
//!
//! - **Canonical model**: intent name → phrases (trimmed, lower-cased, deduplicated),
//!   priority, and declared sample types, extracted from whatever layout the
//!   export uses
//! - **Reference table**: the tracking spreadsheet, with headers resolved through
//!   configurable aliases
//! - **Pairwise diff**: added/removed phrases and priority changes between two documents
//! - **Shared marker**: the kind-column value that limits the 1-vs-3 and 4-vs-2
//!   comparisons to intents meant to exist everywhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use intent_audit::*;
//!
//! let auditor = IntentAuditor::new(AuditConfig::default())?;
//! let report = auditor.run(AuditRequest {
//!     mode: ComparisonMode::Pair2,
//!     uploads: vec![
//!         (DocumentSlot::One, DocumentUpload::from_path("bot_ru.json")?),
//!         (DocumentSlot::Two, DocumentUpload::from_path("bot_kz.json")?),
//!     ],
//!     table: TableSource::File("tracking.csv".into()),
//! })?;
//!
//! report.write_csv_dir("comparison_result")?;
//! println!("{}", report.to_markdown());
//! ```

pub mod classifier;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod matcher;
pub mod normalizer;
pub mod report;
pub mod schema;
pub mod table;
pub mod utils;

#[cfg(feature = "remote")]
pub mod remote;

pub use classifier::{classify, SampleKind};
pub use config::{AuditConfig, ColumnAliases, LocaleProbe};
pub use diff::{diff_pair, PairDiffer, DEFAULT_PREVIEW_LIMIT};
pub use engine::ComparisonEngine;
pub use error::{IntentAuditError, Result};
pub use ingestion::*;
pub use matcher::match_table;
pub use normalizer::{detect_shape, normalize, DocumentShape};
pub use report::*;
pub use schema::*;
pub use table::{spreadsheet_export_url, ReferenceTable, ResolvedColumns, TableRecord, TableSource};

#[cfg(feature = "remote")]
pub use remote::{fetch_table, TableFetcher};

use log::info;

/// Everything needed for one report build, supplied at once.
#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub mode: ComparisonMode,
    pub uploads: Vec<(DocumentSlot, DocumentUpload)>,
    pub table: TableSource,
}

#[derive(Debug, Clone, Default)]
pub struct IntentAuditor {
    config: AuditConfig,
}

impl IntentAuditor {
    pub fn new(config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn build_report(
        &self,
        mode: ComparisonMode,
        documents: &DocumentSet,
        table: &ReferenceTable,
    ) -> Result<ComparisonReport> {
        ComparisonEngine::new(&self.config).build_report(mode, documents, table)
    }

    /// Parses the uploads, loads the table and builds the report. Any failure
    /// aborts the request; no partial report is returned.
    pub fn run(&self, request: AuditRequest) -> Result<ComparisonReport> {
        let documents = DocumentSet::from_uploads(request.uploads)?;
        let table = request.table.load()?;
        let report = self.build_report(request.mode, &documents, &table)?;

        info!(
            "Report ready: {} tables, {} notes",
            report.tables.len(),
            report.notes.len()
        );
        Ok(report)
    }
}
