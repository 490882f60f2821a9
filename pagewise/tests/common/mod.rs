use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pagewise::config::OcrConfig;
use pagewise::error::Result;
use pagewise::secrets::{InMemorySecretStore, SecretStore};

/// Secret store that records every lookup before delegating.
#[derive(Default)]
pub struct RecordingSecretStore {
    inner: InMemorySecretStore,
    calls: Mutex<Vec<(String, Vec<String>, HashSet<String>)>>,
}

impl RecordingSecretStore {
    pub fn new(inner: InMemorySecretStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>, HashSet<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for RecordingSecretStore {
    async fn resolve(
        &self,
        user_id: &str,
        names: &[String],
        optional: &HashSet<String>,
    ) -> Result<HashMap<String, String>> {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), names.to_vec(), optional.clone()));
        self.inner.resolve(user_id, names, optional).await
    }
}

pub fn literal_config(base_url: &str) -> OcrConfig {
    OcrConfig {
        api_key: "sk-literal".to_string(),
        base_url: base_url.to_string(),
        ..OcrConfig::default()
    }
}

/// Write `contents` to a temp file that lives as long as the returned handle.
pub fn temp_document(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Mount the three provider endpoints with fixed responses.
pub async fn mount_happy_path(server: &MockServer, pages: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-123",
            "object": "file",
            "purpose": "ocr"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/files/[^/]+/url$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": "https://signed.example/file-123" })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pages": pages })))
        .mount(server)
        .await;
}
