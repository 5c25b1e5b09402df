use crate::domain::model::{RawRecord, NOT_AVAILABLE, UNKNOWN_PRICE, UNKNOWN_PRODUCT};
use crate::utils::error::{EtlError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// CSS selectors describing the catalog markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub card: String,
    pub title: String,
    pub price: String,
    pub details: String,
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: "div.collection-card".to_string(),
            title: "h3.product-title".to_string(),
            price: "span.price".to_string(),
            details: "div.product-details p".to_string(),
            next_page: "li.page-item.next a".to_string(),
        }
    }
}

/// Result of looking up one field on a card. A missing node is an ordinary
/// outcome, not an extraction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Present(String),
    Missing,
}

impl FieldValue {
    fn from_element(element: Option<ElementRef<'_>>) -> Self {
        match element {
            Some(element) => FieldValue::Present(element_text(element)),
            None => FieldValue::Missing,
        }
    }

    pub fn or_placeholder(self, placeholder: &str) -> String {
        match self {
            FieldValue::Present(text) => text,
            FieldValue::Missing => placeholder.to_string(),
        }
    }
}

/// Trimmed text nodes of `element`, concatenated.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

pub(crate) fn compile_selector(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| EtlError::InvalidConfigValueError {
        field: format!("selectors.{}", field),
        value: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Pulls one product's fields out of a product card.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    card: Selector,
    title: Selector,
    price: Selector,
    details: Selector,
}

impl CardExtractor {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            card: compile_selector("card", &config.card)?,
            title: compile_selector("title", &config.title)?,
            price: compile_selector("price", &config.price)?,
            details: compile_selector("details", &config.details)?,
        })
    }

    pub fn card_selector(&self) -> &Selector {
        &self.card
    }

    /// Extracts a record from the HTML of a single card.
    ///
    /// Fails only when the fragment has no element to treat as the card root
    /// (plain text, comments). Missing fields inside a card fall back to
    /// placeholders.
    pub fn extract_fragment(&self, fragment: &str) -> Result<RawRecord> {
        let html = Html::parse_fragment(fragment);
        let root = html
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| EtlError::CardParse {
                reason: "fragment has no element root".to_string(),
            })?;
        Ok(self.extract(root))
    }

    pub fn extract(&self, card: ElementRef<'_>) -> RawRecord {
        let title = FieldValue::from_element(card.select(&self.title).next());
        let price = FieldValue::from_element(card.select(&self.price).next());
        let details: Vec<ElementRef<'_>> = card.select(&self.details).collect();

        RawRecord {
            title: title.or_placeholder(UNKNOWN_PRODUCT),
            price: price.or_placeholder(UNKNOWN_PRICE),
            rating: details_at(&details, 0).or_placeholder(NOT_AVAILABLE),
            colors: details_at(&details, 1).or_placeholder(NOT_AVAILABLE),
            size: details_at(&details, 2).or_placeholder(NOT_AVAILABLE),
            gender: details_at(&details, 3).or_placeholder(NOT_AVAILABLE),
            timestamp: capture_timestamp(),
        }
    }
}

/// Positional lookup into the details list; out of range is `Missing`.
pub fn details_at(details: &[ElementRef<'_>], index: usize) -> FieldValue {
    FieldValue::from_element(details.get(index).copied())
}

fn capture_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
