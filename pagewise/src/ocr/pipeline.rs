use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::OcrConfig;
use crate::error::{PagewiseError, Result, Stage};
use crate::secrets::SecretStore;

use super::aggregate::{aggregate, MediaKind, OcrOutput};
use super::api::MistralOcrClient;
use super::credentials::CredentialResolver;
use super::transport::HttpTransport;

/// A local file handed over by the hosting application.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub original_name: String,
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestionRequest {
    pub user_id: String,
    pub file: FileDescriptor,
    pub file_id: Option<String>,
    pub entity_id: Option<String>,
}

/// Upload → signed URL → OCR → aggregate, run strictly in order.
///
/// Holds only read-only state, so one instance can serve concurrent
/// ingestions. Any stage failure aborts the run and is returned as
/// [`PagewiseError::DocumentIngestion`]; nothing from earlier stages is kept.
#[derive(Clone)]
pub struct DocumentIngestion {
    resolver: CredentialResolver,
    secrets: Arc<dyn SecretStore>,
    client: MistralOcrClient,
    url_expiry_hours: u32,
}

impl DocumentIngestion {
    pub fn new(config: &OcrConfig, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout_secs)?;
        Ok(Self::with_transport(config, secrets, transport))
    }

    pub fn with_transport(
        config: &OcrConfig,
        secrets: Arc<dyn SecretStore>,
        transport: HttpTransport,
    ) -> Self {
        Self {
            resolver: CredentialResolver::new(config),
            secrets,
            client: MistralOcrClient::new(transport),
            url_expiry_hours: config.url_expiry_hours,
        }
    }

    pub async fn ingest(&self, request: &IngestionRequest) -> Result<OcrOutput> {
        let file = &request.file;
        info!(
            user_id = %request.user_id,
            file_id = ?request.file_id,
            entity_id = ?request.entity_id,
            filename = %file.original_name,
            "Starting OCR ingestion"
        );

        let credentials = run_stage(
            Stage::Credentials,
            self.resolver.resolve(self.secrets.as_ref(), &request.user_id),
        )
        .await?;

        let uploaded = run_stage(
            Stage::Upload,
            self.client.upload_file(&credentials, &file.path, &file.original_name),
        )
        .await?;

        let signed = run_stage(
            Stage::SignedUrl,
            self.client.get_signed_url(&credentials, &uploaded.id, self.url_expiry_hours),
        )
        .await?;

        let kind = MediaKind::classify(&file.original_name, file.mimetype.as_deref());
        let response = run_stage(
            Stage::Ocr,
            self.client.perform_ocr(&credentials, &signed.url, kind.document_type()),
        )
        .await?;

        let output = run_stage(Stage::Aggregate, async {
            Ok(aggregate(&response, &file.original_name))
        })
        .await?;

        info!(
            filename = %output.filename,
            pages = response.pages.len(),
            images = output.images.len(),
            bytes = output.bytes,
            "OCR ingestion complete"
        );
        Ok(output)
    }
}

/// Run one stage, logging and wrapping its failure.
async fn run_stage<T, F>(stage: Stage, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(stage = %stage, "Running ingestion stage");
    match fut.await {
        Ok(value) => Ok(value),
        Err(source) => {
            error!(stage = %stage, error = %source, "OCR ingestion stage failed");
            Err(PagewiseError::ingestion(stage, source))
        }
    }
}
