//! AI-first SEO generation with a deterministic fallback.
//!
//! [`SeoGenerator::generate`] never fails: the AI attempt resolves to an
//! [`AiOutcome`], and every failed outcome is answered by
//! [`generate_fallback`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::fallback::generate_fallback;
use crate::models::{ProductInput, SeoMetadata};
use crate::openai::AiError;
use crate::prompt::{build_prompt, parse_ai_response, MalformedAiResponse, SYSTEM_MESSAGE};

/// Text-completion capability used by the AI path.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("no AI provider configured")]
    NotConfigured,
    #[error(transparent)]
    Provider(#[from] AiError),
    #[error(transparent)]
    Malformed(#[from] MalformedAiResponse),
}

#[derive(Debug)]
pub enum AiOutcome {
    Succeeded(SeoMetadata),
    Failed(FallbackReason),
}

#[derive(Clone, Default)]
pub struct SeoGenerator {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl SeoGenerator {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    pub fn ai_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn try_ai(&self, product: &ProductInput) -> AiOutcome {
        let Some(provider) = &self.provider else {
            return AiOutcome::Failed(FallbackReason::NotConfigured);
        };
        let prompt = build_prompt(product);
        let attempt = async {
            let raw = provider.complete(SYSTEM_MESSAGE, &prompt).await?;
            Ok::<_, FallbackReason>(parse_ai_response(&raw)?)
        };
        match attempt.await {
            Ok(seo) => AiOutcome::Succeeded(seo),
            Err(reason) => AiOutcome::Failed(reason),
        }
    }

    pub async fn generate(&self, product: &ProductInput) -> SeoMetadata {
        match self.try_ai(product).await {
            AiOutcome::Succeeded(seo) => {
                info!(path = "ai", product = %product.name, "✅ SEO metadata generated");
                seo
            }
            AiOutcome::Failed(reason) => {
                warn!(path = "fallback", product = %product.name, %reason, "🔄 Using fallback generator");
                generate_fallback(product)
            }
        }
    }
}
