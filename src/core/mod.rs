pub mod etl;
pub mod extractor;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod walker;

pub use crate::domain::model::{CleanDataset, LoadReport, RawRecord, Table};
pub use crate::domain::ports::{PageFetcher, Pipeline, Storage};
pub use crate::utils::error::Result;
