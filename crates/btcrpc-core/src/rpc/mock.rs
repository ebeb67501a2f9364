use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::protocol::JsonRpcRequest;
use super::transport::{RawResponse, Transport, TransportError};

/// A scripted transport for testing. Replies are handed out in the order
/// they were queued via the builder methods; every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<RawResponse, String>>>,
    requests: Mutex<Vec<Value>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, status: u16, body: &str) -> Self {
        self.push(Ok(RawResponse {
            status,
            body: body.to_owned(),
        }));
        self
    }

    pub fn with_transport_error(self, message: &str) -> Self {
        self.push(Err(message.to_owned()));
        self
    }

    /// Requests seen so far, as JSON.
    pub fn requests(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, reply: Result<RawResponse, String>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &JsonRpcRequest<'_>) -> Result<RawResponse, TransportError> {
        let encoded = serde_json::to_value(request).expect("request must serialize");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(encoded);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(message)) => Err(TransportError(message)),
            None => Err(TransportError("mock transport has no reply queued".to_owned())),
        }
    }
}
