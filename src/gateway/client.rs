use super::{RawResponse, TransportGateway};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a gateway with its own connection pool. `timeout` of `None`
    /// keeps reqwest's default.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new_with_client(base_url, builder.build()?))
    }

    pub fn new_with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl TransportGateway for HttpGateway {
    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<RawResponse> {
        let url = self.endpoint(path);
        tracing::debug!("Sending POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", url, e);
                e
            })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            tracing::warn!("Backend returned status {} for {}", status, url);
        }
        tracing::debug!("Received {} bytes from {}", body.len(), url);

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
