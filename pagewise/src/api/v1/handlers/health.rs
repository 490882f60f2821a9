use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::ocr::{ConfigValue, CredentialResolver};

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub ocr: OcrStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrStatus {
    /// `literal` when key and base URL come straight from config,
    /// `secret_store` when they are resolved per request.
    pub credentials: String,
    /// Configured model, absent when it is resolved per request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub url_expiry_hours: u32,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let ocr_config = &state.config.ocr;

    let credentials = if CredentialResolver::new(ocr_config).is_static() {
        "literal"
    } else {
        "secret_store"
    };

    let model = match ConfigValue::parse(&ocr_config.model) {
        ConfigValue::Literal(model) => Some(model),
        ConfigValue::Empty => Some(crate::config::DEFAULT_MODEL.to_string()),
        ConfigValue::Reference(_) => None,
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ocr: OcrStatus {
            credentials: credentials.to_string(),
            model,
            url_expiry_hours: ocr_config.url_expiry_hours,
        },
    })
}
