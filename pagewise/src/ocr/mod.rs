//! OCR (Optical Character Recognition) Module
//!
//! Turns a local document or image into text through the Mistral OCR API.
//!
//! # Architecture
//!
//! One ingestion runs these stages in order, each depending on the previous
//! one's output:
//! - `credentials`: resolve API key, base URL and model (`CredentialResolver`)
//! - `upload`: stream the file to `POST /files` with purpose `ocr`
//! - `signed_url`: exchange the file id via `GET /files/{id}/url`
//! - `ocr`: submit the URL to `POST /ocr` as `document_url` or `image_url`
//! - `aggregate`: merge pages into one text blob plus an image list
//!
//! # Configuration
//!
//! `OcrConfig` (see `config.rs`) fields may be literals or `${NAME}`
//! placeholders resolved through a `SecretStore`. Empty fields fall back to
//! the `OCR_API_KEY` / `OCR_BASEURL` secrets.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ingestion = DocumentIngestion::new(&config.ocr, Arc::new(EnvSecretStore::new()))?;
//! let output = ingestion.ingest(&request).await?;
//! ```

mod aggregate;
mod api;
mod credentials;
mod pipeline;
mod transport;

pub use aggregate::{aggregate, MediaKind, OcrOutput, SOURCE_TAG};
pub use api::{
    DocumentType, MistralOcrClient, OcrImage, OcrPage, OcrResponse, SignedUrl, UploadedFile,
};
pub use credentials::{
    ConfigValue, CredentialResolver, ResolvedCredentials, FALLBACK_API_KEY_VAR,
    FALLBACK_BASE_URL_VAR,
};
pub use pipeline::{DocumentIngestion, FileDescriptor, IngestionRequest};
pub use transport::HttpTransport;
