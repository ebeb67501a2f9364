use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::config::ClientConfig;
use crate::error::RpcError;

use super::protocol::JsonRpcRequest;

/// Redirects followed before the request fails as a transport error.
pub const MAX_REDIRECTS: usize = 10;

/// Status and body of an HTTP response, before any JSON decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Low-level failure before a complete response was read: refused or timed
/// out connections, redirect loops, truncated bodies.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Carries one encoded request to the daemon and returns the raw reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &JsonRpcRequest<'_>) -> Result<RawResponse, TransportError>;
}

// ==============================================================================
// HttpTransport
// ==============================================================================

/// `reqwest` transport: HTTP POST with Basic auth and the fixed header set.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    user: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RpcError::Config(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url().to_owned(),
            headers: config.headers(),
            user: config.user().to_owned(),
            password: config.password().to_owned(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &JsonRpcRequest<'_>) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            // Set before `.json()`, which only fills in Content-Type when absent.
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_success_range() {
        let ok = RawResponse {
            status: 200,
            body: String::new(),
        };
        let not_found = RawResponse {
            status: 404,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }
}
