//! Turns the scraped text table into typed, validated records.
//!
//! Steps run in a fixed order and later steps rely on the cleanup done by
//! earlier ones:
//!
//! 1. drop rows with a missing value
//! 2. drop exact duplicates
//! 3. drop rows titled with the unknown-product placeholder
//! 4. drop rows whose price carries the unknown marker
//! 5. convert the price to the target currency (non-numeric residue is fatal)
//! 6. drop rows whose rating carries the invalid marker
//! 7. parse the rating
//! 8. parse the color count
//! 9. strip the size label
//! 10. strip the gender label
//!
//! The column check and the empty-input check run before any of this.

use crate::domain::model::{CleanDataset, CleanRecord, RawRecord, Table, Timestamp, COLUMNS};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Constants the cleanup depends on. `Default` matches the fashion catalog
/// (USD prices converted to IDR at 16 000).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub exchange_rate: Decimal,
    pub currency_symbol: String,
    pub grouping_separator: String,
    pub unknown_title: String,
    pub unknown_price_marker: String,
    pub invalid_rating_marker: String,
    pub missing_marker: String,
    pub size_prefix: String,
    pub gender_prefix: String,
    pub rating_min: Decimal,
    pub rating_max: Decimal,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            exchange_rate: Decimal::from(16_000),
            currency_symbol: "$".to_string(),
            grouping_separator: ",".to_string(),
            unknown_title: "Unknown Product".to_string(),
            unknown_price_marker: "Unknown".to_string(),
            invalid_rating_marker: "Invalid".to_string(),
            missing_marker: "N/A".to_string(),
            size_prefix: "Size: ".to_string(),
            gender_prefix: "Gender: ".to_string(),
            rating_min: Decimal::ZERO,
            rating_max: Decimal::from(5),
        }
    }
}

/// Row counts removed by each step, reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub missing_values: usize,
    pub duplicates: usize,
    pub unknown_title: usize,
    pub unknown_price: usize,
    pub non_positive_price: usize,
    pub invalid_rating: usize,
    pub unparseable_rating: usize,
    pub unparseable_colors: usize,
    pub output_rows: usize,
}

pub struct Normalizer {
    settings: NormalizerSettings,
    rating_token: Regex,
    colors_token: Regex,
}

/// A row that survived step 5, with the converted price.
struct PricedRow {
    raw: RawRecord,
    price: Decimal,
}

impl Normalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self {
            settings,
            rating_token: Regex::new(r"[\d.]+").expect("rating pattern is valid"),
            colors_token: Regex::new(r"\d+").expect("colors pattern is valid"),
        }
    }

    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    pub fn normalize(&self, table: &Table) -> Result<CleanDataset> {
        self.normalize_with_stats(table).map(|(dataset, _)| dataset)
    }

    pub fn normalize_with_stats(&self, table: &Table) -> Result<(CleanDataset, NormalizeStats)> {
        let indices = resolve_columns(&table.headers)?;
        if table.is_empty() {
            return Err(EtlError::EmptyDataset {
                source_name: "raw dataset".to_string(),
            });
        }

        let mut stats = NormalizeStats {
            input_rows: table.len(),
            ..NormalizeStats::default()
        };

        // 1. 缺值；保留原始列號供錯誤訊息使用
        let complete: Vec<(usize, RawRecord)> = table
            .rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| Some((index + 1, self.complete_row(row, &indices)?)))
            .collect();
        stats.missing_values = table.len() - complete.len();

        // 2. 重複
        let before = complete.len();
        let mut seen = HashSet::new();
        let unique: Vec<(usize, RawRecord)> = complete
            .into_iter()
            .filter(|(_, record)| seen.insert(record.clone()))
            .collect();
        stats.duplicates = before - unique.len();

        // 3. + 4.
        let before = unique.len();
        let known_title: Vec<(usize, RawRecord)> = unique
            .into_iter()
            .filter(|(_, r)| r.title != self.settings.unknown_title)
            .collect();
        stats.unknown_title = before - known_title.len();

        let before = known_title.len();
        let known_price: Vec<(usize, RawRecord)> = known_title
            .into_iter()
            .filter(|(_, r)| !r.price.contains(&self.settings.unknown_price_marker))
            .collect();
        stats.unknown_price = before - known_price.len();

        // 5. 價格換算；非數字直接中止
        let mut priced = Vec::with_capacity(known_price.len());
        for (row, raw) in known_price {
            let price = self.convert_price(&raw.price, row)?;
            if price <= Decimal::ZERO {
                stats.non_positive_price += 1;
                continue;
            }
            priced.push(PricedRow { raw, price });
        }

        // 6.
        let before = priced.len();
        priced.retain(|p| !p.raw.rating.contains(&self.settings.invalid_rating_marker));
        stats.invalid_rating = before - priced.len();

        // 7. - 10.
        let mut records = Vec::with_capacity(priced.len());
        for PricedRow { raw, price } in priced {
            let Some(rating) = self.parse_rating(&raw.rating) else {
                tracing::debug!("Dropping '{}': no usable rating in '{}'", raw.title, raw.rating);
                stats.unparseable_rating += 1;
                continue;
            };
            let Some(colors) = self.parse_colors(&raw.colors) else {
                tracing::debug!("Dropping '{}': no color count in '{}'", raw.title, raw.colors);
                stats.unparseable_colors += 1;
                continue;
            };

            records.push(CleanRecord {
                size: strip_label(&raw.size, &self.settings.size_prefix),
                gender: strip_label(&raw.gender, &self.settings.gender_prefix),
                title: raw.title,
                price,
                rating,
                colors,
                timestamp: Timestamp::parse(raw.timestamp),
            });
        }

        stats.output_rows = records.len();
        tracing::info!(
            "🧹 Normalized {} -> {} rows (missing {}, duplicates {}, unknown title {}, unknown price {}, \
             invalid rating {}, unparseable rating {}, unparseable colors {})",
            stats.input_rows,
            stats.output_rows,
            stats.missing_values,
            stats.duplicates,
            stats.unknown_title,
            stats.unknown_price,
            stats.invalid_rating,
            stats.unparseable_rating,
            stats.unparseable_colors
        );

        Ok((CleanDataset::new(records), stats))
    }

    fn complete_row(&self, row: &[Option<String>], indices: &[usize; 7]) -> Option<RawRecord> {
        let cell = |i: usize| -> Option<String> {
            let value = row.get(indices[i])?.as_deref()?;
            if value.trim().is_empty() || value == self.settings.missing_marker {
                return None;
            }
            Some(value.to_string())
        };

        Some(RawRecord {
            title: cell(0)?,
            price: cell(1)?,
            rating: cell(2)?,
            colors: cell(3)?,
            size: cell(4)?,
            gender: cell(5)?,
            timestamp: cell(6)?,
        })
    }

    /// Strips the currency symbol and grouping separators, converts and
    /// rounds to cents, halves away from zero as `NUMERIC(10,2)` does.
    /// `row` is the 1-based data row, used in the errors.
    pub fn convert_price(&self, text: &str, row: usize) -> Result<Decimal> {
        let mut cleaned = text.replace(self.settings.currency_symbol.as_str(), "");
        if !self.settings.grouping_separator.is_empty() {
            cleaned = cleaned.replace(self.settings.grouping_separator.as_str(), "");
        }
        let amount = Decimal::from_str(cleaned.trim()).map_err(|_| EtlError::NonNumericPrice {
            row,
            value: text.to_string(),
        })?;
        let converted = amount
            .checked_mul(self.settings.exchange_rate)
            .ok_or_else(|| EtlError::PriceOverflow {
                row,
                value: text.to_string(),
            })?;
        Ok(converted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn parse_rating(&self, text: &str) -> Option<Decimal> {
        let token = self.rating_token.find(text)?;
        let rating = Decimal::from_str(token.as_str()).ok()?;
        (self.settings.rating_min..=self.settings.rating_max)
            .contains(&rating)
            .then_some(rating)
    }

    pub fn parse_colors(&self, text: &str) -> Option<u32> {
        let token = self.colors_token.find(text)?;
        token.as_str().parse::<u32>().ok().filter(|count| *count > 0)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerSettings::default())
    }
}

/// Positions of the expected columns in `headers`, or every missing name.
pub fn resolve_columns(headers: &[String]) -> Result<[usize; 7]> {
    let mut indices = [0usize; 7];
    let mut missing = Vec::new();
    for (slot, column) in COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h.trim() == *column) {
            Some(index) => indices[slot] = index,
            None => missing.push(column.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        tracing::error!("❌ Dataset is missing columns: {:?}", missing);
        Err(EtlError::MissingColumns { columns: missing })
    }
}

fn strip_label(value: &str, label: &str) -> String {
    value.strip_prefix(label).unwrap_or(value).trim().to_string()
}
