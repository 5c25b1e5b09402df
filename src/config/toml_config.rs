use crate::adapters::sheets::SheetsConfig;
use crate::core::extractor::SelectorConfig;
use crate::core::fetcher::DEFAULT_USER_AGENT;
use crate::core::normalizer::NormalizerSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fashion-studio.dicoding.dev/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub selectors: SelectorConfig,
    pub transform: NormalizerSettings,
    pub load: LoadConfig,
    pub sheets: SheetsConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub delay_seconds: f64,
    pub max_pages: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            delay_seconds: 2.0,
            max_pages: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub raw_file: String,
    pub clean_file: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: ".".to_string(),
            raw_file: "scraped_fashion_products.csv".to_string(),
            clean_file: "cleaned_fashion_products.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| EtlError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${DATABASE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs_f64(self.source.delay_seconds.max(0.0))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.base_url", &self.source.base_url)?;
        validate_non_empty_string("source.user_agent", &self.source.user_agent)?;
        validate_range("source.delay_seconds", self.source.delay_seconds, 0.0, 3600.0)?;
        if let Some(max_pages) = self.source.max_pages {
            validate_range("source.max_pages", max_pages, 1, usize::MAX)?;
        }

        validate_path("load.output_path", &self.load.output_path)?;
        validate_path("load.raw_file", &self.load.raw_file)?;
        validate_path("load.clean_file", &self.load.clean_file)?;

        validate_non_empty_string("transform.currency_symbol", &self.transform.currency_symbol)?;
        validate_non_empty_string("transform.unknown_title", &self.transform.unknown_title)?;
        if self.transform.exchange_rate <= rust_decimal::Decimal::ZERO {
            return Err(EtlError::InvalidConfigValueError {
                field: "transform.exchange_rate".to_string(),
                value: self.transform.exchange_rate.to_string(),
                reason: "Exchange rate must be positive".to_string(),
            });
        }
        if self.transform.rating_min > self.transform.rating_max {
            return Err(EtlError::InvalidConfigValueError {
                field: "transform.rating_min".to_string(),
                value: self.transform.rating_min.to_string(),
                reason: "rating_min cannot exceed rating_max".to_string(),
            });
        }

        if self.sheets.spreadsheet_id.is_some() {
            validate_url("sheets.endpoint", &self.sheets.endpoint)?;
            validate_non_empty_string("sheets.range", &self.sheets.range)?;
        }
        if let Some(url) = &self.database.url {
            validate_non_empty_string("database.url", url)?;
        }

        Ok(())
    }
}
