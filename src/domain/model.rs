use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column order shared by the raw and the clean dataset files.
pub const COLUMNS: [&str; 7] = [
    "Title",
    "Price",
    "Rating",
    "Colors",
    "Size",
    "Gender",
    "Timestamp",
];

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const UNKNOWN_PRICE: &str = "Unknown Price";
pub const NOT_AVAILABLE: &str = "N/A";

/// One product card as scraped. Every field is filled, either with page text
/// or with one of the placeholders above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Colors")]
    pub colors: String,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

impl RawRecord {
    pub fn values(&self) -> [&str; 7] {
        [
            self.title.as_str(),
            self.price.as_str(),
            self.rating.as_str(),
            self.colors.as_str(),
            self.size.as_str(),
            self.gender.as_str(),
            self.timestamp.as_str(),
        ]
    }
}

/// A text dataset with no schema attached. Empty cells are `None`, the same
/// way they read back from a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn from_raw_records(records: &[RawRecord]) -> Self {
        Self {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records
                .iter()
                .map(|r| {
                    r.values()
                        .iter()
                        .map(|v| (!v.is_empty()).then(|| v.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price", with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "Rating", with = "rust_decimal::serde::str")]
    pub rating: Decimal,
    #[serde(rename = "Colors")]
    pub colors: u32,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
}

/// Timestamp cell of a clean record. The text is kept exactly as it came in
/// so date-only values are written back unchanged; `instant` is filled when
/// the text is an ISO date or date-time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Timestamp {
    text: String,
    instant: Option<NaiveDateTime>,
}

impl Timestamp {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let instant = parse_timestamp(&text);
        Self { text, instant }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn instant(&self) -> Option<NaiveDateTime> {
        self.instant
    }
}

impl From<String> for Timestamp {
    fn from(text: String) -> Self {
        Self::parse(text)
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.text
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(instant: NaiveDateTime) -> Self {
        Self {
            text: instant.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            instant: Some(instant),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Accepts RFC 3339, a naive ISO date-time, or a bare date (midnight).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Clean records plus the column names they were read or produced with.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanDataset {
    pub columns: Vec<String>,
    pub records: Vec<CleanRecord>,
}

impl CleanDataset {
    pub fn new(records: Vec<CleanRecord>) -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// `None` when no spreadsheet is configured.
    pub sheets_ok: Option<bool>,
    /// `None` when no database is configured.
    pub rows_inserted: Option<u64>,
}
