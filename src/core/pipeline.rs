use crate::adapters::dataset::{
    clean_dataset_from_csv, clean_dataset_to_csv, raw_records_to_csv, table_from_csv,
};
use crate::adapters::postgres::PostgresSink;
use crate::adapters::sheets::SheetsSink;
use crate::config::toml_config::TomlConfig;
use crate::core::fetcher::HttpFetcher;
use crate::core::normalizer::Normalizer;
use crate::core::walker::PaginationWalker;
use crate::core::{CleanDataset, LoadReport, PageFetcher, Pipeline, RawRecord, Storage, Table};
use crate::utils::error::Result;
use reqwest::Client;

pub struct FashionPipeline<S: Storage, F: PageFetcher> {
    storage: S,
    walker: PaginationWalker<F>,
    normalizer: Normalizer,
    config: TomlConfig,
    client: Client,
}

impl<S: Storage> FashionPipeline<S, HttpFetcher> {
    /// Pipeline that scrapes over HTTP with the configured user agent.
    pub fn from_config(storage: S, config: TomlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.source.user_agent, config.request_timeout())?;
        Self::new(storage, fetcher, config)
    }
}

impl<S: Storage, F: PageFetcher> FashionPipeline<S, F> {
    pub fn new(storage: S, fetcher: F, config: TomlConfig) -> Result<Self> {
        let walker = PaginationWalker::new(fetcher, &config.source.base_url, &config.selectors)?
            .with_delay(config.page_delay())
            .with_max_pages(config.source.max_pages);

        Ok(Self {
            storage,
            walker,
            normalizer: Normalizer::new(config.transform.clone()),
            config,
            client: Client::new(),
        })
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    /// Raw table previously written by `extract`.
    pub async fn read_raw_table(&self) -> Result<Table> {
        tracing::debug!("Reading raw dataset from {}", self.config.load.raw_file);
        let data = self.storage.read_file(&self.config.load.raw_file).await?;
        table_from_csv(&data)
    }

    /// Clean dataset previously written by `transform`.
    pub async fn read_clean_dataset(&self) -> Result<CleanDataset> {
        tracing::debug!("Reading clean dataset from {}", self.config.load.clean_file);
        let data = self.storage.read_file(&self.config.load.clean_file).await?;
        clean_dataset_from_csv(&data)
    }
}

#[async_trait::async_trait]
impl<S: Storage, F: PageFetcher> Pipeline for FashionPipeline<S, F> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        let records = self.walker.walk().await;
        if records.is_empty() {
            tracing::warn!("No products were scraped");
        }

        let csv = raw_records_to_csv(&records)?;
        self.storage
            .write_file(&self.config.load.raw_file, &csv)
            .await?;
        tracing::info!(
            "💾 Saved {} raw records to {}",
            records.len(),
            self.config.load.raw_file
        );

        Ok(records)
    }

    async fn transform(&self, table: Table) -> Result<CleanDataset> {
        let dataset = self.normalizer.normalize(&table)?;

        let csv = clean_dataset_to_csv(&dataset)?;
        self.storage
            .write_file(&self.config.load.clean_file, &csv)
            .await?;
        tracing::info!(
            "💾 Saved {} clean records to {}",
            dataset.len(),
            self.config.load.clean_file
        );

        Ok(dataset)
    }

    async fn load(&self, dataset: CleanDataset) -> Result<LoadReport> {
        let sheets_ok = match &self.config.sheets.spreadsheet_id {
            Some(spreadsheet_id) => {
                let sink = SheetsSink::new(
                    self.client.clone(),
                    spreadsheet_id.clone(),
                    self.config.sheets.clone(),
                );
                Some(sink.load(&dataset).await)
            }
            None => {
                tracing::debug!("No spreadsheet configured, skipping");
                None
            }
        };

        let rows_inserted = match &self.config.database.url {
            Some(url) => {
                // 延遲連線：欄位檢查失敗時不會碰資料庫
                let sink = PostgresSink::connect_lazy(url)?;
                Some(sink.load(&dataset).await?)
            }
            None => {
                tracing::debug!("No database configured, skipping");
                None
            }
        };

        Ok(LoadReport {
            rows: dataset.len(),
            sheets_ok,
            rows_inserted,
        })
    }
}
