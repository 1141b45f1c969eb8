use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::client::{HttpTransport, RawResponse, RequestDescriptor, TransportError};

/// In-memory transport: canned responses keyed by URL path, every request recorded.
/// Paths without a canned response fail like an unreachable host.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<HashMap<String, (u16, Vec<u8>)>>,
    requests: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl MockTransport {
    pub const BASE_URL: &'static str = "http://backend.test/api";

    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `path` (relative to [`Self::BASE_URL`]) with a JSON body.
    pub fn respond(self, path: &str, status: u16, body: Value) -> Self {
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        self.respond_raw(path, status, bytes)
    }

    pub fn respond_raw(self, path: &str, status: u16, body: Vec<u8>) -> Self {
        let mut responses = (*self.responses).clone();
        responses.insert(format!("/api{}", path), (status, body));
        Self {
            responses: Arc::new(responses),
            requests: self.requests,
        }
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, TransportError> {
        let path = request.url.path().to_string();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let (status, body) = self
            .responses
            .get(&path)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("connection refused: {}", path)))?;

        Ok(RawResponse { status, body })
    }
}
