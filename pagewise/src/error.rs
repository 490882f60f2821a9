use std::fmt;

use thiserror::Error;

/// Ordered stages of a single document ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Credentials,
    Upload,
    SignedUrl,
    Ocr,
    Aggregate,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Credentials,
        Stage::Upload,
        Stage::SignedUrl,
        Stage::Ocr,
        Stage::Aggregate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Credentials => "credentials",
            Stage::Upload => "upload",
            Stage::SignedUrl => "signed_url",
            Stage::Ocr => "ocr",
            Stage::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single outbound call to the OCR provider.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

impl TransportError {
    /// HTTP status returned by the provider, when the call got that far.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            TransportError::Request { source, .. } => source.status(),
            TransportError::Status { status, .. } => Some(*status),
        }
    }
}

#[derive(Error, Debug)]
pub enum PagewiseError {
    #[error("Credential resolution error: {0}")]
    CredentialResolution(String),

    #[error("Upload error: {0}")]
    Upload(#[source] TransportError),

    #[error("Signed URL error: {0}")]
    SignedUrl(#[source] TransportError),

    #[error("OCR invocation error: {0}")]
    OcrInvocation(#[source] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Document ingestion failed at {stage} stage: {source}")]
    DocumentIngestion {
        stage: Stage,
        #[source]
        source: Box<PagewiseError>,
    },
}

impl PagewiseError {
    /// Wrap a stage failure into the single outward-facing ingestion error.
    pub fn ingestion(stage: Stage, source: PagewiseError) -> Self {
        PagewiseError::DocumentIngestion {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage that failed, for wrapped ingestion errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PagewiseError::DocumentIngestion { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PagewiseError>;
