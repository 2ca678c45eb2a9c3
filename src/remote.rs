use crate::error::{IntentAuditError, Result};
use crate::table::{spreadsheet_export_url, ReferenceTable};
use log::info;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads a reference table from a link (a Google Sheets edit link is
/// rewritten to its CSV export first).
#[derive(Clone)]
pub struct TableFetcher {
    client: Client,
}

impl Default for TableFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TableFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<ReferenceTable> {
        if url.trim().is_empty() {
            return Err(IntentAuditError::TableLoad(
                "no table uploaded and no link given".to_string(),
            ));
        }

        let export_url = spreadsheet_export_url(url);
        info!("Fetching reference table from {}", export_url);

        let response = self
            .client
            .get(&export_url)
            .send()
            .await
            .map_err(|e| IntentAuditError::TableLoad(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntentAuditError::TableLoad(format!(
                "download failed (status {})",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IntentAuditError::TableLoad(format!("download interrupted: {}", e)))?;
        ReferenceTable::from_csv_bytes(&bytes)
    }
}

/// [`TableFetcher::fetch`] with a default client.
pub async fn fetch_table(url: &str) -> Result<ReferenceTable> {
    TableFetcher::new().fetch(url).await
}
