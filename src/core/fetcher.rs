use crate::domain::ports::PageFetcher;
use crate::utils::error::{EtlError, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// HTTP page fetcher. One client is shared by every request of a walk so
/// connections get reused across pages.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let value =
            HeaderValue::from_str(user_agent).map_err(|e| EtlError::InvalidConfigValueError {
                field: "source.user_agent".to_string(),
                value: user_agent.to_string(),
                reason: e.to_string(),
            })?;
        headers.insert(USER_AGENT, value);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        tracing::debug!("Response status {} from {}", response.status(), url);
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("❌ Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}
