//! Transport to the generative backend
//!
//! A single JSON-over-HTTP POST shared by the chat and image clients. The
//! gateway passes every response it receives through untouched; status and
//! body interpretation belong to [`crate::reply`].

pub mod client;
pub mod mock;

pub use client::HttpGateway;
pub use mock::{MockGateway, RecordedRequest};

use crate::Result;
use async_trait::async_trait;

pub const CHAT_PATH: &str = "/generate_chat";
pub const IMAGE_PATH: &str = "/generate_image";

/// Status and body of a response, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait TransportGateway: Send + Sync {
    /// Issue one POST of `body` to `path` relative to the backend base URL.
    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<RawResponse>;
}
