//! Connection settings for an [`RpcClient`](crate::rpc::RpcClient).
//!
//! A [`ClientConfig`] is produced once by the client builder and never
//! mutated afterwards. It carries the credentials, the endpoint, the derived
//! base URL, and the fixed header set sent with every request.

use std::fmt;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Url;

use crate::error::RpcError;

/// Loopback address used when no host is given.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Bitcoin Core's mainnet RPC port.
pub const DEFAULT_PORT: u16 = 8332;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable connection configuration owned by a single client.
#[derive(Clone)]
pub struct ClientConfig {
    user: String,
    password: String,
    host: String,
    port: u16,
    url: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl ClientConfig {
    pub(crate) fn new(
        user: String,
        password: String,
        host: String,
        port: u16,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RpcError> {
        let url = base_url(&host, port)?;
        Ok(Self {
            user,
            password,
            host,
            port,
            url,
            timeout,
            connect_timeout,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `http://{host}:{port}/`
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Headers attached to every request. The daemon expects `text/plain`
    /// even though the body is JSON.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn base_url(host: &str, port: u16) -> Result<String, RpcError> {
    if host.is_empty() {
        return Err(RpcError::Config("host must not be empty".to_owned()));
    }
    let host_part = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let candidate = format!("http://{host_part}:{port}/");
    let parsed = Url::parse(&candidate)
        .map_err(|e| RpcError::Config(format!("invalid endpoint `{candidate}`: {e}")))?;
    if parsed.path() != "/" || parsed.query().is_some() {
        return Err(RpcError::Config(format!(
            "host `{host}` must not contain a path or query"
        )));
    }
    Ok(candidate)
}

pub(crate) fn check_credentials(user: &str, password: &str) -> Result<(), RpcError> {
    if user.is_empty() || password.is_empty() {
        return Err(RpcError::Config(
            "rpc user and rpc password must both be non-empty".to_owned(),
        ));
    }
    Ok(())
}
