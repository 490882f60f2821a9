use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::ocr::{DocumentIngestion, HttpTransport};
use crate::secrets::SecretStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ingestion: DocumentIngestion,
}

impl AppState {
    pub fn new(config: Config, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let transport = HttpTransport::new(config.ocr.timeout_secs)?;
        Ok(Self::with_transport(config, secrets, transport))
    }

    pub fn with_transport(
        config: Config,
        secrets: Arc<dyn SecretStore>,
        transport: HttpTransport,
    ) -> Self {
        let ingestion = DocumentIngestion::with_transport(&config.ocr, secrets, transport);
        Self {
            config: Arc::new(config),
            ingestion,
        }
    }
}
