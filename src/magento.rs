//! Catalog client for the Magento REST API.
//!
//! One attempt per call and no retries. A refused write is reported as
//! [`CatalogError::Rejected`] with the remote status and message, apart from
//! transport failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::config::CatalogConfig;
use crate::models::{CatalogProduct, SeoMetadata};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product with SKU '{0}' not found in the catalog")]
    NotFound(String),
    #[error("catalog refused the update ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("catalog request failed: {0}")]
    Upstream(String),
    #[error("catalog request timed out")]
    Timeout,
    #[error("unreadable catalog response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

/// Read and write access to catalog products.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_by_sku(&self, sku: &str) -> Result<CatalogProduct, CatalogError>;
    async fn update_metadata(&self, sku: &str, seo: &SeoMetadata) -> Result<(), CatalogError>;
}

pub struct MagentoClient {
    client: Client,
    api_token: String,
    base_url: Url,
}

impl MagentoClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            CatalogError::Upstream(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            client,
            api_token: config.api_token.clone(),
            base_url,
        })
    }

    /// `{base}/rest/V1/products/{sku}`, with the SKU encoded as one segment.
    fn product_url(&self, sku: &str) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::Upstream(format!("base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["rest", "V1", "products", sku]);
        Ok(url)
    }
}

#[async_trait]
impl CatalogClient for MagentoClient {
    async fn fetch_by_sku(&self, sku: &str) -> Result<CatalogProduct, CatalogError> {
        let url = self.product_url(sku)?;
        info!("🔗 Fetching product {} from catalog", sku);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(sku.to_string()));
        }
        if !status.is_success() {
            let message = remote_message(response).await?;
            error!("❌ Catalog returned {} for {}: {}", status, sku, message);
            return Err(CatalogError::Upstream(format!("catalog returned {status}: {message}")));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CatalogError::InvalidResponse(format!("product payload: {e}")))
    }

    async fn update_metadata(&self, sku: &str, seo: &SeoMetadata) -> Result<(), CatalogError> {
        let url = self.product_url(sku)?;
        let payload = json!({
            "product": {
                "sku": sku,
                "custom_attributes": [
                    { "attribute_code": "meta_title", "value": seo.meta_title },
                    { "attribute_code": "meta_description", "value": seo.meta_description },
                    { "attribute_code": "meta_keyword", "value": seo.meta_keywords }
                ]
            }
        });
        info!("📤 Updating SEO attributes of {}", sku);

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("✅ Catalog accepted SEO update for {}", sku);
            return Ok(());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(sku.to_string()));
        }

        let message = remote_message(response).await?;
        error!("❌ Catalog rejected update of {} ({}): {}", sku, status, message);
        Err(CatalogError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

async fn remote_message(response: Response) -> Result<String, CatalogError> {
    let body = response.text().await?;
    Ok(render_message(&body))
}

/// Renders a Magento error body. `{"message": "...%1...", "parameters": ...}`
/// has its placeholders filled; anything else is returned trimmed.
fn render_message(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let Some(message) = map.get("message").and_then(Value::as_str) else {
        return body.trim().to_string();
    };

    let text = |v: &Value| v.as_str().map_or_else(|| v.to_string(), str::to_string);
    let mut rendered = message.to_string();
    match map.get("parameters") {
        Some(Value::Array(params)) => {
            // Highest index first so %1 does not clobber %10.
            for (i, param) in params.iter().enumerate().rev() {
                rendered = rendered.replace(&format!("%{}", i + 1), &text(param));
            }
        }
        Some(Value::Object(params)) => {
            for (name, param) in params {
                rendered = rendered.replace(&format!("%{name}"), &text(param));
            }
        }
        _ => {}
    }
    rendered
}
