//! v1 response envelope.
//!
//! ```json
//! { "data": { "filename": "a.pdf", "text": "..." } }
//! { "error": { "code": "bad_gateway", "message": "Document ingestion failed at upload stage" } }
//! ```
//!
//! Exactly one of `data` / `error` is present. Provider failures only name
//! the failed stage; secrets and upstream bodies stay in the logs.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::PagewiseError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Machine-readable error classification, serialized in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    Unauthorized,
    PayloadTooLarge,
    InternalError,
    /// The OCR provider rejected or failed one of the ingestion calls.
    BadGateway,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::PayloadTooLarge => "payload_too_large",
            Self::InternalError => "internal_error",
            Self::BadGateway => "bad_gateway",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Safe to show to end users.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status: code.status(),
        }
    }

    pub fn internal() -> Self {
        Self::error(ErrorCode::InternalError, INTERNAL_MESSAGE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize v1 response");
                let fallback = ApiResponse::<()>::internal();
                (fallback.status, Json(serde_json::json!({ "error": fallback.error })))
                    .into_response()
            }
        }
    }
}

impl<T: Serialize> From<PagewiseError> for ApiResponse<T> {
    fn from(err: PagewiseError) -> Self {
        if let Some(stage) = err.stage() {
            tracing::warn!(stage = %stage, error = %err, "Document ingestion failed");
            return ApiResponse::error(
                ErrorCode::BadGateway,
                format!("Document ingestion failed at {stage} stage"),
            );
        }

        match err {
            PagewiseError::Validation(message) => {
                ApiResponse::error(ErrorCode::InvalidRequest, message)
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                ApiResponse::internal()
            }
        }
    }
}

impl<T: Serialize> From<MultipartError> for ApiResponse<T> {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiResponse::error(ErrorCode::PayloadTooLarge, "Uploaded file is too large")
        } else {
            ApiResponse::error(
                ErrorCode::InvalidRequest,
                format!("Invalid multipart body: {}", err.body_text()),
            )
        }
    }
}
