use std::time::Duration;

use reqwest::{multipart, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{PagewiseError, Result, TransportError};

/// Shared HTTP client for the OCR provider.
///
/// Cloning is cheap and shares the underlying connection pool. No retries are
/// attempted and no body size limit is imposed.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: Option<u64>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| PagewiseError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        form: multipart::Form,
    ) -> std::result::Result<T, TransportError> {
        let request = self.client.post(url).bearer_auth(api_key).multipart(form);
        self.send("POST", url, request).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, TransportError> {
        let request = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .query(query);
        self.send("GET", url, request).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> std::result::Result<T, TransportError> {
        let request = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .json(body);
        self.send("POST", url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> std::result::Result<T, TransportError> {
        debug!(method, url, "Sending OCR provider request");

        let response = request.send().await.map_err(|source| {
            normalize(
                method,
                TransportError::Request {
                    url: url.to_string(),
                    source,
                },
            )
        })?;

        let status = response.status();
        debug!(method, url, status = %status, "OCR provider responded");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(normalize(
                method,
                TransportError::Status {
                    url: url.to_string(),
                    status,
                    body,
                },
            ));
        }

        response.json::<T>().await.map_err(|source| {
            normalize(
                method,
                TransportError::Request {
                    url: url.to_string(),
                    source,
                },
            )
        })
    }
}

/// Log a failed provider call once and hand the error back unchanged.
fn normalize(method: &'static str, err: TransportError) -> TransportError {
    warn!(method, status = ?err.status(), error = %err, "OCR provider request failed");
    err
}
