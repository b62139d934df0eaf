mod config;
mod fallback;
mod magento;
mod models;
mod openai;
mod prompt;
mod routes;
mod seo;
mod text;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::magento::{CatalogClient, MagentoClient};
use crate::openai::OpenAiClient;
use crate::routes::{router, AppState};
use crate::seo::{CompletionProvider, SeoGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("invalid configuration")?;

    let provider: Option<Arc<dyn CompletionProvider>> = match &config.openai {
        Some(openai) => {
            let key_prefix: String = openai.api_key.chars().take(6).collect();
            tracing::info!("OpenAI client initialized (key {}..., model {})", key_prefix, openai.model);
            Some(Arc::new(OpenAiClient::new(openai).context("building OpenAI client")?))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY is not set. AI calls will be skipped and the fallback generator will be used.");
            None
        }
    };

    let catalog: Option<Arc<dyn CatalogClient>> = match &config.catalog {
        Some(catalog) => {
            tracing::info!("Catalog client pointed at {}", catalog.base_url);
            Some(Arc::new(MagentoClient::new(catalog).context("building catalog client")?))
        }
        None => {
            tracing::error!("MAGENTO_BASE_URL and MAGENTO_API_TOKEN must both be set; catalog endpoints are disabled.");
            None
        }
    };

    let state = AppState {
        seo: SeoGenerator::new(provider),
        catalog,
        store_country: config.store_country.as_str().into(),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
