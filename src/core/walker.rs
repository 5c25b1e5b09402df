//! Follows a catalog's "next page" links until they run out.
//!
//! The walk is strictly sequential: one page is fetched, parsed and
//! extracted before the next link is followed, and a fixed delay separates
//! consecutive requests. A page that cannot be fetched ends the walk; the
//! records gathered so far are kept.

use crate::core::extractor::{compile_selector, CardExtractor, SelectorConfig};
use crate::domain::model::RawRecord;
use crate::domain::ports::PageFetcher;
use crate::utils::error::{EtlError, Result};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    Fetching(Url),
    Done,
}

/// What one listing page contributed to the walk.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    pub records: Vec<RawRecord>,
    pub skipped_cards: usize,
    pub next: Option<Url>,
}

pub struct PaginationWalker<F: PageFetcher> {
    fetcher: F,
    extractor: CardExtractor,
    next_page: Selector,
    base_url: Url,
    delay: Duration,
    max_pages: Option<usize>,
}

impl<F: PageFetcher> PaginationWalker<F> {
    pub fn new(fetcher: F, base_url: &str, selectors: &SelectorConfig) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| EtlError::InvalidConfigValueError {
            field: "source.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            fetcher,
            extractor: CardExtractor::new(selectors)?,
            next_page: compile_selector("next_page", &selectors.next_page)?,
            base_url,
            delay: DEFAULT_PAGE_DELAY,
            max_pages: None,
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Walks the catalog from the base URL and returns every extracted
    /// record in page order.
    pub async fn walk(&self) -> Vec<RawRecord> {
        let mut records = Vec::new();
        let mut pages = 0usize;
        let mut state = WalkState::Fetching(self.base_url.clone());

        while let WalkState::Fetching(url) = state {
            tracing::info!("🌐 Scraping page: {}", url);
            let Some(body) = self.fetcher.fetch(url.as_str()).await else {
                tracing::warn!("Stopping walk at {}: page could not be fetched", url);
                break;
            };
            pages += 1;

            let outcome = self.parse_page(&url, &body);
            tracing::info!(
                "Page {} yielded {} records ({} cards skipped)",
                pages,
                outcome.records.len(),
                outcome.skipped_cards
            );
            records.extend(outcome.records);

            state = match outcome.next {
                Some(_) if self.max_pages.is_some_and(|max| pages >= max) => {
                    tracing::warn!("Reached page limit of {}, stopping walk", pages);
                    WalkState::Done
                }
                Some(next) => {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    WalkState::Fetching(next)
                }
                None => WalkState::Done,
            };
        }

        tracing::info!("✅ Walk finished: {} records from {} pages", records.len(), pages);
        records
    }

    /// Parses one listing page. Synchronous so the parsed document never
    /// lives across an await point. The next link is resolved against
    /// `page_url`, the address the body was fetched from.
    pub fn parse_page(&self, page_url: &Url, body: &[u8]) -> PageOutcome {
        let html = String::from_utf8_lossy(body);
        let (fragments, href) = {
            let document = Html::parse_document(&html);
            let fragments: Vec<String> = document
                .select(self.extractor.card_selector())
                .map(|card| card.html())
                .collect();
            let href = document
                .select(&self.next_page)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(str::to_string);
            (fragments, href)
        };

        let mut outcome = PageOutcome::default();
        for fragment in &fragments {
            match self.extractor.extract_fragment(fragment) {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping product card: {}", e);
                    outcome.skipped_cards += 1;
                }
            }
        }

        outcome.next = href.and_then(|href| match page_url.join(&href) {
            Ok(next) => Some(next),
            Err(e) => {
                tracing::warn!("Ignoring unresolvable next-page link '{}': {}", href, e);
                None
            }
        });
        outcome
    }
}
