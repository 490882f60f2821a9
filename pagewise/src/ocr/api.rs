use std::path::Path;

use reqwest::{multipart, Body};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{PagewiseError, Result};

use super::credentials::ResolvedCredentials;
use super::transport::HttpTransport;

const UPLOAD_PURPOSE: &str = "ocr";

/// Provider metadata for an uploaded file. Only `id` is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: String,
}

/// Input schema variant for the OCR endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    DocumentUrl,
    ImageUrl,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OcrDocument<'a> {
    DocumentUrl { document_url: &'a str },
    ImageUrl { image_url: &'a str },
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    include_image_base64: bool,
    document: OcrDocument<'a>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrImage {
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// Client for the Mistral files and OCR endpoints.
#[derive(Clone, Debug)]
pub struct MistralOcrClient {
    transport: HttpTransport,
}

impl MistralOcrClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Stream a local file to `{base_url}/files` with purpose `ocr`.
    ///
    /// The file is read in chunks as the request body is sent and is closed
    /// when the request finishes, whether it succeeded or not.
    pub async fn upload_file(
        &self,
        credentials: &ResolvedCredentials,
        file_path: &Path,
        file_name: &str,
    ) -> Result<UploadedFile> {
        let file = tokio::fs::File::open(file_path).await?;
        let length = file.metadata().await?.len();
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = multipart::Part::stream_with_length(body, length)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())
            .map_err(|e| PagewiseError::Validation(format!("Invalid MIME type {mime}: {e}")))?;

        let form = multipart::Form::new()
            .text("purpose", UPLOAD_PURPOSE)
            .part("file", part);

        let url = format!("{}/files", credentials.base_url);
        debug!(file_name, bytes = length, "Uploading document for OCR");

        self.transport
            .post_multipart(&url, &credentials.api_key, form)
            .await
            .map_err(PagewiseError::Upload)
    }

    /// Exchange an uploaded file id for a URL valid for `expiry_hours`.
    pub async fn get_signed_url(
        &self,
        credentials: &ResolvedCredentials,
        file_id: &str,
        expiry_hours: u32,
    ) -> Result<SignedUrl> {
        let url = format!("{}/files/{}/url", credentials.base_url, file_id);

        self.transport
            .get_json(
                &url,
                &credentials.api_key,
                &[("expiry", expiry_hours.to_string())],
            )
            .await
            .map_err(PagewiseError::SignedUrl)
    }

    pub async fn perform_ocr(
        &self,
        credentials: &ResolvedCredentials,
        document_url: &str,
        document_type: DocumentType,
    ) -> Result<OcrResponse> {
        let document = match document_type {
            DocumentType::DocumentUrl => OcrDocument::DocumentUrl { document_url },
            DocumentType::ImageUrl => OcrDocument::ImageUrl {
                image_url: document_url,
            },
        };

        let request = OcrRequest {
            model: &credentials.model,
            include_image_base64: false,
            document,
        };

        let url = format!("{}/ocr", credentials.base_url);
        self.transport
            .post_json(&url, &credentials.api_key, &request)
            .await
            .map_err(PagewiseError::OcrInvocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::{
        matchers::{body_json, body_string_contains, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn credentials(base_url: String) -> ResolvedCredentials {
        ResolvedCredentials {
            api_key: "test-api-key".to_string(),
            base_url,
            model: "mistral-ocr-latest".to_string(),
        }
    }

    fn client() -> MistralOcrClient {
        MistralOcrClient::new(HttpTransport::new(None).unwrap())
    }

    #[test]
    fn test_ocr_request_document_shape() {
        let request = OcrRequest {
            model: "mistral-ocr-latest",
            include_image_base64: false,
            document: OcrDocument::DocumentUrl {
                document_url: "https://signed/doc",
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "mistral-ocr-latest",
                "include_image_base64": false,
                "document": {
                    "type": "document_url",
                    "document_url": "https://signed/doc"
                }
            })
        );
    }

    #[test]
    fn test_page_without_images_field_parses() {
        let response: OcrResponse =
            serde_json::from_str(r#"{"pages":[{"index":0,"markdown":"text"}]}"#).unwrap();
        assert_eq!(response.pages.len(), 1);
        assert!(response.pages[0].images.is_empty());
    }

    #[tokio::test]
    async fn test_upload_streams_multipart_with_purpose() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_string_contains("name=\"purpose\""))
            .and(body_string_contains("ocr"))
            .and(body_string_contains("filename=\"report.pdf\""))
            .and(body_string_contains("%PDF-1.4 fake"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-123",
                "object": "file",
                "purpose": "ocr"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();

        let uploaded = client()
            .upload_file(&credentials(mock_server.uri()), file.path(), "report.pdf")
            .await
            .unwrap();

        assert_eq!(uploaded.id, "file-123");
        assert_eq!(uploaded.metadata["purpose"], "ocr");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = client()
            .upload_file(
                &credentials(mock_server.uri()),
                Path::new("/nonexistent/pagewise/input.pdf"),
                "input.pdf",
            )
            .await;

        assert!(matches!(result, Err(PagewiseError::Io(_))));
    }

    #[tokio::test]
    async fn test_signed_url_passes_expiry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/file-123/url"))
            .and(query_param("expiry", "24"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://signed.example/file-123"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let signed = client()
            .get_signed_url(&credentials(mock_server.uri()), "file-123", 24)
            .await
            .unwrap();
        assert_eq!(signed.url, "https://signed.example/file-123");
    }

    #[tokio::test]
    async fn test_signed_url_error_maps_to_stage_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/missing/url"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
            .mount(&mock_server)
            .await;

        let result = client()
            .get_signed_url(&credentials(mock_server.uri()), "missing", 24)
            .await;
        assert!(matches!(result, Err(PagewiseError::SignedUrl(_))));
    }

    #[tokio::test]
    async fn test_ocr_image_variant() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ocr"))
            .and(body_json(serde_json::json!({
                "model": "mistral-ocr-latest",
                "include_image_base64": false,
                "document": {
                    "type": "image_url",
                    "image_url": "https://signed.example/img"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [{ "markdown": "caption", "images": [] }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let response = client()
            .perform_ocr(
                &credentials(mock_server.uri()),
                "https://signed.example/img",
                DocumentType::ImageUrl,
            )
            .await
            .unwrap();
        assert_eq!(response.pages[0].markdown, "caption");
    }

    #[tokio::test]
    async fn test_ocr_server_error_maps_to_invocation_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client()
            .perform_ocr(
                &credentials(mock_server.uri()),
                "https://signed.example/doc",
                DocumentType::DocumentUrl,
            )
            .await;

        match result {
            Err(PagewiseError::OcrInvocation(err)) => {
                assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("expected OCR invocation error, got {other:?}"),
        }
    }
}
