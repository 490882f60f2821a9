use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::ocr::{FileDescriptor, IngestionRequest, OcrOutput};

/// Header carrying the requester id used for per-user secret lookup.
pub const USER_ID_HEADER: &str = "x-user-id";
const DEFAULT_USER_ID: &str = "anonymous";
const DEFAULT_FILE_NAME: &str = "upload";

/// Stream one multipart field into a fresh temporary file.
async fn stage_field(mut field: Field<'_>) -> Result<NamedTempFile, ApiResponse<OcrOutput>> {
    let temp = tempfile::Builder::new()
        .prefix("pagewise-")
        .tempfile()
        .map_err(|e| internal("create temporary upload file", e))?;
    let mut out = tokio::fs::File::from_std(
        temp.reopen()
            .map_err(|e| internal("open temporary upload file", e))?,
    );

    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk)
            .await
            .map_err(|e| internal("write upload chunk", e))?;
    }
    out.flush()
        .await
        .map_err(|e| internal("flush upload file", e))?;

    Ok(temp)
}

fn internal(action: &str, err: std::io::Error) -> ApiResponse<OcrOutput> {
    tracing::error!(error = %err, "Failed to {action}");
    ApiResponse::internal()
}

/// `POST /api/v1/documents:ocr`
///
/// Accepts a multipart form with a `file` field and optional `fileId` and
/// `entityId` fields. The file is streamed to a temporary file, run through
/// the OCR pipeline, and the aggregated text is returned. The temporary file
/// is removed when the request completes.
#[utoipa::path(
    post,
    path = "/api/v1/documents:ocr",
    tag = "documents",
    operation_id = "documents.ocr",
    request_body(content_type = "multipart/form-data", content = String, description = "File upload with optional fileId and entityId fields"),
    params(
        ("X-User-Id" = Option<String>, Header, description = "Requester id for per-user OCR credentials"),
    ),
    responses(
        (status = 200, description = "Document converted to text", body = OcrOutput),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 413, description = "Upload too large", body = ApiError),
        (status = 502, description = "OCR provider failure", body = ApiError),
    )
)]
pub async fn ocr_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResponse<OcrOutput> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string();

    let mut staged: Option<(NamedTempFile, String, Option<String>)> = None;
    let mut file_id: Option<String> = None;
    let mut entity_id: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return e.into(),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if staged.is_some() {
                    return ApiResponse::error(
                        ErrorCode::InvalidRequest,
                        "Only one 'file' field is allowed",
                    );
                }

                let file_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_string();
                let content_type = field.content_type().map(str::to_string);

                match stage_field(field).await {
                    Ok(temp) => staged = Some((temp, file_name, content_type)),
                    Err(resp) => return resp,
                }
            }
            "fileId" | "file_id" => match field.text().await {
                Ok(t) => file_id = non_blank(t),
                Err(e) => return e.into(),
            },
            "entityId" | "entity_id" => match field.text().await {
                Ok(t) => entity_id = non_blank(t),
                Err(e) => return e.into(),
            },
            _ => {}
        }
    }

    let Some((temp, original_name, mimetype)) = staged else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Missing required 'file' field");
    };

    let request = IngestionRequest {
        user_id,
        file: FileDescriptor {
            path: temp.path().to_path_buf(),
            original_name,
            mimetype,
        },
        file_id: Some(file_id.unwrap_or_else(|| Uuid::new_v4().to_string())),
        entity_id,
    };

    let result = state.ingestion.ingest(&request).await;
    drop(temp);

    match result {
        Ok(output) => ApiResponse::success(output),
        Err(e) => e.into(),
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
