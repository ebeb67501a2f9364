use std::fmt;

/// Locally assigned code for a transport failure reaching the endpoint.
pub const RPC_CONNECTION_ERROR: i64 = 1;

/// Locally assigned code for rejected credentials.
pub const RPC_AUTH_ERROR: i64 = 2;

/// Fixed message raised when the daemon answers 401 with an empty body.
pub const AUTH_ERROR_MESSAGE: &str =
    "got empty payload and bad status code (possible wrong RPC credentials)";

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("failed to establish connection to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("{0}")]
    Auth(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("invalid JSON-RPC response (HTTP {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl RpcError {
    /// Classification of this error within the call taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Auth(_) => ErrorKind::Auth,
            Self::InvalidParams(_) => ErrorKind::InvalidParams,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Config(_) => ErrorKind::Config,
            Self::Server { code, .. } => classify(*code),
        }
    }
}

// ==============================================================================
// Classification
// ==============================================================================

/// Outcome classes for a failed call.
///
/// `Connection` and `Auth` are the only locally recognized kinds; every other
/// kind is reported by the daemon inside the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Auth,
    InvalidParams,
    InvalidResponse,
    /// Rejected at client construction; never produced by a call.
    Config,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InternalError,
    ServerError,
    Generic,
}

impl ErrorKind {
    /// Whether a call that ends with this kind is raised instead of being
    /// handed back as an envelope.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Connection | Self::Auth)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Auth => write!(f, "auth"),
            Self::InvalidParams => write!(f, "invalid_params"),
            Self::InvalidResponse => write!(f, "invalid_response"),
            Self::Config => write!(f, "config"),
            Self::ParseError => write!(f, "parse_error"),
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::MethodNotFound => write!(f, "method_not_found"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Map a JSON-RPC `error.code` to its [`ErrorKind`].
pub fn classify(code: i64) -> ErrorKind {
    match code {
        RPC_CONNECTION_ERROR => ErrorKind::Connection,
        RPC_AUTH_ERROR => ErrorKind::Auth,
        -32700 => ErrorKind::ParseError,
        -32600 => ErrorKind::InvalidRequest,
        -32601 => ErrorKind::MethodNotFound,
        -32602 => ErrorKind::InvalidParams,
        -32603 => ErrorKind::InternalError,
        -32099..=-32000 => ErrorKind::ServerError,
        _ => ErrorKind::Generic,
    }
}
