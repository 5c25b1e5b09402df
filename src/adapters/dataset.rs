//! CSV encoding of the raw and clean datasets, the files that separate the
//! extract, transform and load stages.

use crate::core::normalizer::resolve_columns;
use crate::domain::model::{CleanDataset, CleanRecord, RawRecord, Table, COLUMNS};
use crate::utils::error::{EtlError, Result};

pub fn raw_records_to_csv(records: &[RawRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    into_bytes(writer)
}

/// Reads any CSV with a header row. Empty cells become `None`.
pub fn table_from_csv(data: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}

pub fn clean_dataset_to_csv(dataset: &CleanDataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if dataset.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in &dataset.records {
        writer.serialize(record)?;
    }
    into_bytes(writer)
}

/// Reads a clean dataset file. The header must carry every clean column;
/// extra columns are kept in `columns` so a sink can refuse them.
pub fn clean_dataset_from_csv(data: &[u8]) -> Result<CleanDataset> {
    let mut reader = csv::Reader::from_reader(data);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    resolve_columns(&columns)?;

    let records = reader
        .deserialize::<CleanRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CleanDataset { columns, records })
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| {
        EtlError::IoError(std::io::Error::other(format!(
            "failed to flush CSV writer: {}",
            e.error()
        )))
    })
}
