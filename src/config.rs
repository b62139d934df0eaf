use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAGENTO_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STORE_COUNTRY: &str = "BR";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` disables the AI path; generation always uses the fallback.
    pub openai: Option<OpenAiConfig>,
    /// `None` when base URL or token is missing; catalog endpoints answer 503.
    pub catalog: Option<CatalogConfig>,
    pub store_country: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secs = |key: &str, default: u64| -> Result<Duration> {
            let secs = match get(key) {
                Some(v) => v.parse().with_context(|| format!("{key} must be a number of seconds, got {v:?}"))?,
                None => default,
            };
            Ok(Duration::from_secs(secs))
        };

        let openai = match get("OPENAI_API_KEY") {
            Some(api_key) => Some(OpenAiConfig {
                api_key,
                base_url: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_BASE.into()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
                timeout: secs("OPENAI_TIMEOUT_SECS", DEFAULT_OPENAI_TIMEOUT_SECS)?,
            }),
            None => None,
        };

        let catalog = match (get("MAGENTO_BASE_URL"), get("MAGENTO_API_TOKEN")) {
            (Some(base_url), Some(api_token)) => Some(CatalogConfig {
                base_url,
                api_token,
                timeout: secs("MAGENTO_TIMEOUT_SECS", DEFAULT_MAGENTO_TIMEOUT_SECS)?,
            }),
            _ => None,
        };

        let port = match get("PORT") {
            Some(v) => v.parse().with_context(|| format!("PORT must be a port number, got {v:?}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai,
            catalog,
            store_country: get("STORE_COUNTRY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_STORE_COUNTRY.into()),
            port,
        })
    }
}
