//! Sheets API v4 `spreadsheets.values.get`.

use serde::Deserialize;
use sheetsproxy_auth::AuthenticatedClient;
use sheetsproxy_core::CellValue;
use tracing::debug;

use crate::error::{ProxyError, ProxyResult};

/// Default Sheets API endpoint.
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    // Absent when the range is empty.
    #[serde(default)]
    values: Vec<Vec<CellValue>>,
}

/// Reads cell values from the Sheets API.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    base_url: String,
}

impl Default for SheetsClient {
    fn default() -> Self {
        Self::new(SHEETS_BASE_URL)
    }
}

impl SheetsClient {
    /// Creates a client against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// Returns the rows of `range`, as loosely-typed cells.
    pub async fn get_values(
        &self,
        client: &AuthenticatedClient,
        spreadsheet_id: &str,
        range: &str,
    ) -> ProxyResult<Vec<Vec<CellValue>>> {
        let url = self.values_url(spreadsheet_id, range);
        debug!(spreadsheet_id = %spreadsheet_id, range = %range, "fetching values");

        let value_range: ValueRange = client
            .get_json(&url)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        Ok(value_range.values)
    }
}
