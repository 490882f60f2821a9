use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};

use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pagewise API",
        version = "1.0.0",
        description = "Document-to-text extraction backed by Mistral OCR.",
    ),
    paths(
        handlers::health::health_check,
        handlers::documents::ocr_document,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        // Documents
        crate::ocr::OcrOutput,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::OcrStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "documents", description = "Document OCR (auth required)"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&ApiKeyAuth),
)]
pub struct ApiDoc;

/// Documents `PAGEWISE_API_KEYS` bearer auth on the protected routes.
struct ApiKeyAuth;

impl Modify for ApiKeyAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .description(Some("One of the keys listed in PAGEWISE_API_KEYS"))
            .build();
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme("bearer_auth", SecurityScheme::Http(scheme));
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
