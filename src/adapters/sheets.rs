//! Spreadsheet sink writing through the Google Sheets values API.
//!
//! Failures never abort the run: they are logged and reported as `false`.

use crate::domain::model::{CleanDataset, COLUMNS};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
pub const ACCESS_TOKEN_ENV: &str = "SHEETS_ACCESS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub range: String,
    /// File holding a bearer token. Falls back to `SHEETS_ACCESS_TOKEN`.
    pub credentials_file: Option<PathBuf>,
    pub endpoint: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            range: "Sheet1!A1".to_string(),
            credentials_file: None,
            endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
        }
    }
}

/// Header row followed by one row per record, both in `COLUMNS` order.
/// Timestamps go out as the text they were cleaned with.
pub fn to_grid(dataset: &CleanDataset) -> Vec<Vec<Value>> {
    let mut grid = Vec::with_capacity(dataset.len() + 1);
    grid.push(COLUMNS.iter().map(|c| json!(c)).collect());
    for record in &dataset.records {
        grid.push(vec![
            json!(record.title),
            json!(record.price.to_f64()),
            json!(record.rating.to_f64()),
            json!(record.colors),
            json!(record.size),
            json!(record.gender),
            json!(record.timestamp.as_str()),
        ]);
    }
    grid
}

pub struct SheetsSink {
    client: Client,
    spreadsheet_id: String,
    config: SheetsConfig,
}

impl SheetsSink {
    pub fn new(client: Client, spreadsheet_id: impl Into<String>, config: SheetsConfig) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            config,
        }
    }

    /// Writes the dataset, returning whether the spreadsheet accepted it.
    pub async fn load(&self, dataset: &CleanDataset) -> bool {
        match self.try_load(dataset).await {
            Ok(()) => {
                tracing::info!(
                    "✅ Wrote {} rows to spreadsheet {}",
                    dataset.len(),
                    self.spreadsheet_id
                );
                true
            }
            Err(e) => {
                tracing::error!("❌ Failed to write to spreadsheet {}: {}", self.spreadsheet_id, e);
                false
            }
        }
    }

    async fn try_load(&self, dataset: &CleanDataset) -> Result<()> {
        let token = self.access_token().await?;
        let url = self.values_url()?;
        let body = json!({
            "range": self.config.range,
            "majorDimension": "ROWS",
            "values": to_grid(dataset),
        });

        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EtlError::SinkError {
                sink: "sheets".to_string(),
                message: format!("HTTP {}: {}", status, detail),
            });
        }
        Ok(())
    }

    async fn access_token(&self) -> Result<String> {
        let token = match &self.config.credentials_file {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => std::env::var(ACCESS_TOKEN_ENV).map_err(|_| EtlError::SinkError {
                sink: "sheets".to_string(),
                message: format!("no credentials file and {} is not set", ACCESS_TOKEN_ENV),
            })?,
        };

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(EtlError::SinkError {
                sink: "sheets".to_string(),
                message: "credential is empty".to_string(),
            });
        }
        Ok(token)
    }

    fn values_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            EtlError::InvalidConfigValueError {
                field: "sheets.endpoint".to_string(),
                value: self.config.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;
        url.path_segments_mut()
            .map_err(|_| EtlError::config("sheets.endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.config.range.as_str(),
            ]);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CleanRecord;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset() -> CleanDataset {
        CleanDataset::new(vec![CleanRecord {
            title: "Product A".to_string(),
            price: Decimal::from(160_000),
            rating: Decimal::new(45, 1),
            colors: 2,
            size: "M".to_string(),
            gender: "Male".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .into(),
        }])
    }

    fn token_file(token: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", token).unwrap();
        file
    }

    fn config(server: &MockServer, credentials: &NamedTempFile) -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: Some("sheet-123".to_string()),
            credentials_file: Some(credentials.path().to_path_buf()),
            endpoint: server.base_url(),
            ..SheetsConfig::default()
        }
    }

    #[test]
    fn test_grid_has_header_and_typed_cells() {
        let grid = to_grid(&dataset());

        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0], json!("Title"));
        assert_eq!(grid[0][6], json!("Timestamp"));
        assert_eq!(grid[1][1], json!(160000.0));
        assert_eq!(grid[1][2], json!(4.5));
        assert_eq!(grid[1][3], json!(2));
        assert_eq!(grid[1][6], json!("2023-01-01T00:00:00"));
    }

    #[test]
    fn test_grid_header_follows_cell_order() {
        let mut dataset = dataset();
        dataset.columns = vec![
            "Timestamp", "Gender", "Size", "Colors", "Rating", "Price", "Title", "Brand",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let grid = to_grid(&dataset);

        assert_eq!(grid[0], COLUMNS.iter().map(|c| json!(c)).collect::<Vec<_>>());
        assert_eq!(grid[0].len(), grid[1].len());
        assert_eq!(grid[1][0], json!("Product A"));
    }

    #[tokio::test]
    async fn test_load_success() {
        let server = MockServer::start();
        let credentials = token_file("test-token");
        let sheets_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/v4/spreadsheets/sheet-123/values/Sheet1!A1")
                .query_param("valueInputOption", "RAW")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({"updatedRows": 2}));
        });

        let sink = SheetsSink::new(Client::new(), "sheet-123", config(&server, &credentials));
        let ok = sink.load(&dataset()).await;

        sheets_mock.assert();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_load_rejected_credentials_reports_failure() {
        let server = MockServer::start();
        let credentials = token_file("expired");
        let sheets_mock = server.mock(|when, then| {
            when.method(PUT).path("/v4/spreadsheets/sheet-123/values/Sheet1!A1");
            then.status(401).body("invalid credentials");
        });

        let sink = SheetsSink::new(Client::new(), "sheet-123", config(&server, &credentials));
        let ok = sink.load(&dataset()).await;

        sheets_mock.assert();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_missing_credentials_file_reports_failure() {
        let sink = SheetsSink::new(
            Client::new(),
            "sheet-123",
            SheetsConfig {
                spreadsheet_id: Some("sheet-123".to_string()),
                credentials_file: Some(PathBuf::from("/nonexistent/sheets-token")),
                ..SheetsConfig::default()
            },
        );
        assert!(!sink.load(&dataset()).await);
    }
}
