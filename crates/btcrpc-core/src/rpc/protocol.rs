use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{classify, ErrorKind, RpcError};

/// Version tag sent with every request. Bitcoin Core answers 1.0-style
/// requests with non-2xx statuses on error, which the client relies on.
pub const JSONRPC_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// Structured `error` member of a response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn kind(&self) -> ErrorKind {
        classify(self.code)
    }
}

/// The `{result, error, id}` envelope, returned to callers as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    /// Must be null or `{code, message}`. Any other shape (a bare string,
    /// say) fails to decode, and the call raises
    /// [`RpcError::InvalidResponse`] instead of passing the envelope through.
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(RpcErrorObject::kind)
    }

    /// Unwrap the envelope, turning a populated `error` into
    /// [`RpcError::Server`].
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) => Err(RpcError::Server {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result),
        }
    }
}
