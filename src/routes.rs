use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    magento::{CatalogClient, CatalogError},
    models::{CatalogProduct, ProductInput, SeoMetadata, SkuInput},
    seo::SeoGenerator,
    text::non_blank,
};

#[derive(Clone)]
pub struct AppState {
    pub seo: SeoGenerator,
    pub catalog: Option<Arc<dyn CatalogClient>>,
    pub store_country: Arc<str>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("catalog is not configured; set MAGENTO_BASE_URL and MAGENTO_API_TOKEN")]
    CatalogNotConfigured,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        let (status, body) = match self {
            Self::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "detail": detail }),
            ),
            Self::CatalogNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "catalog_not_configured", "detail": detail }),
            ),
            Self::Catalog(CatalogError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "detail": detail }),
            ),
            Self::Catalog(CatalogError::Rejected { status, message }) => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": "upstream_rejected",
                    "detail": "Catalog failed to save product.",
                    "upstream_status": status,
                    "upstream_message": message,
                }),
            ),
            Self::Catalog(CatalogError::Timeout) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "upstream_timeout", "detail": detail }),
            ),
            Self::Catalog(CatalogError::Upstream(_) | CatalogError::InvalidResponse(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "upstream_error", "detail": detail }),
            ),
        };
        if status.is_server_error() {
            tracing::error!(%status, %detail, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/seo-meta", post(generate_seo_meta))
        .route("/seo-meta/sku", post(generate_seo_meta_from_sku))
        .route("/seo-meta/sku/apply", post(apply_seo_meta_from_sku))
        .route("/test-product/:sku", get(test_product_lookup))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %Uuid::new_v4()
                    )
                }))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

impl AppState {
    fn catalog(&self) -> Result<&dyn CatalogClient, ApiError> {
        self.catalog.as_deref().ok_or(ApiError::CatalogNotConfigured)
    }

    /// Fetches the catalog record for `input.sku` and maps it to generation input.
    async fn product_for_sku(&self, input: &SkuInput) -> Result<(String, CatalogProduct, ProductInput), ApiError> {
        let catalog = self.catalog()?;
        let sku = non_blank(Some(input.sku.as_str()))
            .ok_or_else(|| ApiError::Validation("`sku` is required".into()))?
            .to_string();

        let raw = catalog.fetch_by_sku(&sku).await?;
        let country = non_blank(input.country.as_deref()).unwrap_or(&self.store_country);
        let product = raw.to_product_input(input.language.as_deref(), country);
        if product.name.is_empty() {
            return Err(ApiError::Validation(format!("catalog product '{sku}' has no name")));
        }
        Ok((sku, raw, product))
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "ai_enabled": state.seo.ai_enabled(),
        "catalog_configured": state.catalog.is_some(),
    }))
}

pub async fn generate_seo_meta(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<SeoMetadata>, ApiError> {
    let Json(mut product) = payload?;
    product.name = non_blank(Some(product.name.as_str()))
        .ok_or_else(|| ApiError::Validation("`name` is required".into()))?
        .to_string();

    tracing::info!("🚀 Generating SEO metadata for: {}", product.name);
    Ok(Json(state.seo.generate(&product).await))
}

pub async fn generate_seo_meta_from_sku(
    State(state): State<AppState>,
    payload: Result<Json<SkuInput>, JsonRejection>,
) -> Result<Json<SeoMetadata>, ApiError> {
    let Json(input) = payload?;
    let (sku, _, product) = state.product_for_sku(&input).await?;

    tracing::info!("🚀 Generating SEO metadata for SKU {}", sku);
    Ok(Json(state.seo.generate(&product).await))
}

pub async fn apply_seo_meta_from_sku(
    State(state): State<AppState>,
    payload: Result<Json<SkuInput>, JsonRejection>,
) -> Result<Json<SeoMetadata>, ApiError> {
    let Json(input) = payload?;
    let (sku, raw, product) = state.product_for_sku(&input).await?;
    if let Some(existing) = raw.existing_metadata() {
        tracing::info!(sku = %sku, previous_title = %existing.meta_title, "replacing existing SEO metadata");
    }

    let seo = state.seo.generate(&product).await;
    state.catalog()?.update_metadata(&sku, &seo).await?;

    tracing::info!("✅ SEO metadata applied to SKU {}", sku);
    Ok(Json(seo))
}

pub async fn test_product_lookup(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<CatalogProduct>, ApiError> {
    let product = state.catalog()?.fetch_by_sku(&sku).await?;
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::fallback::generate_fallback;

    #[derive(Default)]
    struct FakeCatalog {
        product: Option<Value>,
        reject: Option<(u16, &'static str)>,
        transport_failure: bool,
        update_failure: Mutex<Option<CatalogError>>,
        updates: Mutex<Vec<(String, SeoMetadata)>>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn fetch_by_sku(&self, sku: &str) -> Result<CatalogProduct, CatalogError> {
            if self.transport_failure {
                return Err(CatalogError::Upstream("connection refused".into()));
            }
            match &self.product {
                Some(p) if p["sku"] == sku => Ok(serde_json::from_value(p.clone()).expect("product")),
                _ => Err(CatalogError::NotFound(sku.to_string())),
            }
        }

        async fn update_metadata(&self, sku: &str, seo: &SeoMetadata) -> Result<(), CatalogError> {
            if let Some((status, message)) = self.reject {
                return Err(CatalogError::Rejected { status, message: message.into() });
            }
            if let Some(err) = self.update_failure.lock().expect("lock").take() {
                return Err(err);
            }
            self.updates.lock().expect("lock").push((sku.to_string(), seo.clone()));
            Ok(())
        }
    }

    fn laptop_record() -> Value {
        json!({
            "id": 11,
            "sku": "LAPTOP-BLUE",
            "name": "Blue Gaming Laptop",
            "type_id": "simple",
            "custom_attributes": [
                { "attribute_code": "short_description", "value": "<p>High-performance gaming laptop</p>" },
                { "attribute_code": "description", "value": "RTX 4090, Intel i9, 32GB RAM" }
            ]
        })
    }

    fn app(catalog: Option<Arc<FakeCatalog>>) -> Router {
        router(AppState {
            seo: SeoGenerator::default(),
            catalog: catalog.map(|c| c as Arc<dyn CatalogClient>),
            store_country: "BR".into(),
        })
    }

    fn catalog_with_laptop() -> FakeCatalog {
        FakeCatalog {
            product: Some(laptop_record()),
            ..Default::default()
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn seo_meta_uses_fallback_without_ai() {
        let input = json!({
            "name": "Blue Gaming Laptop",
            "short_description": "High-performance gaming laptop",
            "description": "RTX 4090, Intel i9, 32GB RAM",
            "country": "BR",
            "language": "pt-BR"
        });
        let (status, body) = send(app(None), post("/seo-meta", input.clone())).await;

        assert_eq!(status, StatusCode::OK);
        let expected = generate_fallback(&serde_json::from_value(input).expect("input"));
        assert_eq!(body, serde_json::to_value(expected).expect("json"));
        assert!(body["meta_title"].as_str().expect("title").contains("Blue Gaming Laptop"));
        assert!(body["meta_description"]
            .as_str()
            .expect("description")
            .starts_with("High-performance gaming laptop"));
    }

    #[tokio::test]
    async fn seo_meta_requires_name() {
        let (status, body) = send(app(None), post("/seo-meta", json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(app(None), post("/seo-meta", json!({ "language": "en" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/seo-meta")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .expect("request");
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn sku_generation_reads_catalog() {
        let catalog = Arc::new(catalog_with_laptop());
        let (status, body) = send(
            app(Some(catalog)),
            post("/seo-meta/sku", json!({ "sku": "LAPTOP-BLUE", "language": "en-US", "country": "US" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta_title"], "Blue Gaming Laptop | Premium Selection");
        assert_eq!(
            body["meta_description"],
            "High-performance gaming laptop. Visit our official store in the United States."
        );
    }

    #[tokio::test]
    async fn unknown_sku_is_404() {
        let catalog = Arc::new(catalog_with_laptop());
        let (status, body) =
            send(app(Some(catalog)), post("/seo-meta/sku", json!({ "sku": "UNKNOWN-SKU" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn blank_sku_is_400() {
        let catalog = Arc::new(catalog_with_laptop());
        let (status, _) = send(app(Some(catalog)), post("/seo-meta/sku", json!({ "sku": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transport_failure_is_500() {
        let catalog = Arc::new(FakeCatalog {
            transport_failure: true,
            ..Default::default()
        });
        let (status, body) =
            send(app(Some(catalog)), post("/seo-meta/sku", json!({ "sku": "LAPTOP-BLUE" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "upstream_error");
    }

    #[tokio::test]
    async fn apply_writes_generated_metadata_back() {
        let catalog = Arc::new(catalog_with_laptop());
        let (status, body) = send(
            app(Some(catalog.clone())),
            post("/seo-meta/sku/apply", json!({ "sku": "LAPTOP-BLUE" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let updates = catalog.updates.lock().expect("lock");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "LAPTOP-BLUE");
        assert_eq!(serde_json::to_value(&updates[0].1).expect("json"), body);
        assert_eq!(body["meta_title"], "Blue Gaming Laptop | Seleção Premium");
    }

    #[tokio::test]
    async fn apply_rejection_is_502_with_upstream_details() {
        let catalog = Arc::new(FakeCatalog {
            reject: Some((400, "The \"price\" attribute value is empty.")),
            ..catalog_with_laptop()
        });
        let (status, body) = send(
            app(Some(catalog)),
            post("/seo-meta/sku/apply", json!({ "sku": "LAPTOP-BLUE" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["upstream_status"], 400);
        assert_eq!(body["upstream_message"], "The \"price\" attribute value is empty.");
        assert_eq!(body["error"], "upstream_rejected");
        assert_eq!(body["detail"], "Catalog failed to save product.");
    }

    #[tokio::test]
    async fn apply_transport_failures_are_500() {
        let cases = [
            (CatalogError::Timeout, "upstream_timeout"),
            (CatalogError::Upstream("connection reset".into()), "upstream_error"),
        ];
        for (failure, code) in cases {
            let catalog = Arc::new(FakeCatalog {
                update_failure: Mutex::new(Some(failure)),
                ..catalog_with_laptop()
            });
            let (status, body) = send(
                app(Some(catalog.clone())),
                post("/seo-meta/sku/apply", json!({ "sku": "LAPTOP-BLUE" })),
            )
            .await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], code);
            assert!(body.get("upstream_status").is_none());
            assert!(catalog.updates.lock().expect("lock").is_empty());
        }
    }

    #[tokio::test]
    async fn test_product_passes_record_through() {
        let catalog = Arc::new(catalog_with_laptop());
        let request = Request::builder()
            .uri("/test-product/LAPTOP-BLUE")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(app(Some(catalog.clone())), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, laptop_record());

        let request = Request::builder()
            .uri("/test-product/NOPE")
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(app(Some(catalog)), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_endpoints_need_configuration() {
        let (status, body) = send(app(None), post("/seo-meta/sku", json!({ "sku": "LAPTOP-BLUE" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "catalog_not_configured");
    }

    #[tokio::test]
    async fn health_reports_capabilities() {
        let request = Request::builder().uri("/health").body(Body::empty()).expect("request");
        let (status, body) = send(app(None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "ai_enabled": false, "catalog_configured": false }));
    }
}
