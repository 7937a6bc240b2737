use super::{RawResponse, TransportGateway};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
enum ScriptedReply {
    Response(RawResponse),
    TransportFailure(String),
}

/// In-memory gateway that replays scripted replies in order and records
/// every request it sees. Once the script runs out it answers `200` with a
/// fixed body.
#[derive(Clone)]
pub struct MockGateway {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    latency: Option<Duration>,
}

impl MockGateway {
    pub const DEFAULT_BODY: &'static str = "mock reply";

    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    pub fn with_text(self, body: &str) -> Self {
        self.with_response(RawResponse::ok(body))
    }

    pub fn with_status(self, status: u16, body: &str) -> Self {
        self.with_response(RawResponse::new(status, body))
    }

    pub fn with_response(self, response: RawResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Response(response));
        self
    }

    pub fn with_transport_failure(self, reason: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::TransportFailure(reason.to_string()));
        self
    }

    /// Delay every reply, so tests can overlap calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportGateway for MockGateway {
    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            body: body.clone(),
        });
        let reply = self.replies.lock().unwrap().pop_front();

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::TransportFailure(reason)) => Err(Error::transport(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, reason),
            )),
            None => Ok(RawResponse::ok(Self::DEFAULT_BODY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_replays_script_in_order() {
        let gateway = MockGateway::new()
            .with_text("first")
            .with_status(500, "boom")
            .with_transport_failure("connection refused");

        let body = serde_json::json!({ "n": 1 });
        assert_eq!(
            gateway.post("/a", &body).await.unwrap(),
            RawResponse::ok("first")
        );
        assert_eq!(gateway.post("/b", &body).await.unwrap().status, 500);
        assert!(gateway.post("/c", &body).await.unwrap_err().is_transport());
        assert_eq!(
            gateway.post("/d", &body).await.unwrap(),
            RawResponse::ok(MockGateway::DEFAULT_BODY)
        );
    }

    #[tokio::test]
    async fn test_mock_gateway_records_requests() {
        let gateway = MockGateway::new();
        let probe = gateway.clone();

        assert_eq!(probe.get_call_count(), 0);
        gateway
            .post("/generate_chat", &serde_json::json!({ "model": "x" }))
            .await
            .unwrap();

        assert_eq!(probe.get_call_count(), 1);
        let requests = probe.get_requests();
        assert_eq!(requests[0].path, "/generate_chat");
        assert_eq!(requests[0].body["model"], "x");
    }
}
