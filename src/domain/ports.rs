use crate::domain::model::{CleanDataset, LoadReport, RawRecord, Table};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source of raw page bodies. `None` means the page could not be retrieved;
/// the failure has already been reported by the implementation.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Option<Vec<u8>>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, table: Table) -> Result<CleanDataset>;
    async fn load(&self, dataset: CleanDataset) -> Result<LoadReport>;
}
