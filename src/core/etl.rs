use crate::core::{LoadReport, Pipeline, Table};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<LoadReport> {
        tracing::info!("Starting ETL process...");

        // Extract
        tracing::info!("📥 Extracting products...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", records.len());

        // Transform
        tracing::info!("🔄 Transforming records...");
        let dataset = self
            .pipeline
            .transform(Table::from_raw_records(&records))
            .await?;
        tracing::info!("Transformed into {} clean records", dataset.len());

        // Load
        tracing::info!("📤 Loading dataset...");
        let report = self.pipeline.load(dataset).await?;
        tracing::info!(
            "Load finished: {} rows, spreadsheet: {:?}, database rows: {:?}",
            report.rows,
            report.sheets_ok,
            report.rows_inserted
        );

        Ok(report)
    }
}
