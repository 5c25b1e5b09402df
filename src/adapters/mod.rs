// Adapters layer: concrete implementations for external systems (files, spreadsheet, database).

pub mod dataset;
pub mod postgres;
pub mod sheets;
pub mod storage;
