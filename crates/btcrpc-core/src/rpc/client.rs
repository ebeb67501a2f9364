use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::config::{
    check_credentials, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_TIMEOUT,
};
use crate::error::{ErrorKind, RpcError, AUTH_ERROR_MESSAGE};
use crate::events::{CallEvent, CallPhase, CallSink, TracingSink};

use super::protocol::{JsonRpcRequest, RpcResponse};
use super::transport::{HttpTransport, RawResponse, Transport};

// ==============================================================================
// Call Statistics
// ==============================================================================

/// Snapshot of the per-client call counters.
///
/// `total == success + error` holds for every snapshot: both sides are
/// updated together when a call completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub total: u64,
    pub success: u64,
    pub error: u64,
}

// ==============================================================================
// RpcClient
// ==============================================================================

/// Bitcoin Core JSON-RPC client.
///
/// Every request goes through [`RpcClient::call`]; the typed wrappers in
/// [`crate::methods`] only validate and shape parameters.
pub struct RpcClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn CallSink>,
    next_id: AtomicU64,
    stats: Mutex<CallStats>,
}

impl RpcClient {
    /// Client for `127.0.0.1:8332` with the given credentials.
    pub fn new(user: &str, password: &str) -> Result<Self, RpcError> {
        Self::builder(user, password).build()
    }

    pub fn builder(user: &str, password: &str) -> RpcClientBuilder {
        RpcClientBuilder::new(user, password)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        self.config.url()
    }

    /// Issue one JSON-RPC call.
    ///
    /// Transport failures and an empty 401 reply are raised as
    /// [`RpcError::Connection`] and [`RpcError::Auth`]. Any other non-2xx
    /// reply carrying a JSON envelope is returned as-is so the caller can
    /// inspect `error.code` and `error.message`.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcResponse, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.emit(id, method, CallPhase::Started);

        let request = JsonRpcRequest::new(id, method, &params);
        let raw = match self.transport.send(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                return Err(self.fail(
                    id,
                    method,
                    None,
                    RpcError::Connection {
                        url: self.config.url().to_owned(),
                        message: err.to_string(),
                    },
                ));
            }
        };

        if raw.status == 401 && raw.body.is_empty() {
            return Err(self.fail(
                id,
                method,
                Some(raw.status),
                RpcError::Auth(AUTH_ERROR_MESSAGE.to_owned()),
            ));
        }

        let envelope = match decode_envelope(&raw) {
            Ok(envelope) => envelope,
            Err(err) => return Err(self.fail(id, method, Some(raw.status), err)),
        };

        if raw.is_success() {
            self.record(true);
            self.emit(id, method, CallPhase::Succeeded { status: raw.status });
            return Ok(envelope);
        }

        self.record(false);
        let (kind, message) = match &envelope.error {
            Some(err) => (err.kind(), err.message.clone()),
            None => (
                ErrorKind::Generic,
                format!("HTTP status {} without error object", raw.status),
            ),
        };
        self.emit(
            id,
            method,
            CallPhase::Failed {
                status: Some(raw.status),
                kind,
                message: message.clone(),
            },
        );

        match kind {
            ErrorKind::Connection => Err(RpcError::Connection {
                url: self.config.url().to_owned(),
                message,
            }),
            ErrorKind::Auth => Err(RpcError::Auth(message)),
            _ => Ok(envelope),
        }
    }

    /// Number of calls that have completed, successfully or not.
    pub fn total_count(&self) -> u64 {
        self.stats().total
    }

    pub fn success_count(&self) -> u64 {
        self.stats().success
    }

    pub fn error_count(&self) -> u64 {
        self.stats().error
    }

    pub fn stats(&self) -> CallStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a failed call, report it to the sink and hand the error back
    /// for raising.
    fn fail(&self, id: u64, method: &str, status: Option<u16>, err: RpcError) -> RpcError {
        self.record(false);
        self.emit(
            id,
            method,
            CallPhase::Failed {
                status,
                kind: err.kind(),
                message: err.to_string(),
            },
        );
        err
    }

    fn record(&self, success: bool) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total += 1;
        if success {
            stats.success += 1;
        } else {
            stats.error += 1;
        }
    }

    fn emit(&self, id: u64, method: &str, phase: CallPhase) {
        self.sink.record(&CallEvent::new(id, method, phase));
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn decode_envelope(raw: &RawResponse) -> Result<RpcResponse, RpcError> {
    serde_json::from_str(&raw.body).map_err(|e| RpcError::InvalidResponse {
        status: raw.status,
        message: format!("decode JSON-RPC response: {e}; body={}", raw.body),
    })
}

// ==============================================================================
// Builder
// ==============================================================================

pub struct RpcClientBuilder {
    user: String,
    password: String,
    host: String,
    port: u16,
    timeout: Duration,
    connect_timeout: Duration,
    reject_empty_credentials: bool,
    sink: Option<Arc<dyn CallSink>>,
    transport: Option<Arc<dyn Transport>>,
}

impl RpcClientBuilder {
    fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_owned(),
            password: password.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reject_empty_credentials: false,
            sink: None,
            transport: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Whole-request timeout, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Fail [`build`](Self::build) when the user or password is empty.
    /// Off by default.
    pub fn reject_empty_credentials(mut self, reject: bool) -> Self {
        self.reject_empty_credentials = reject;
        self
    }

    /// Event sink; defaults to [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn CallSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the HTTP transport, e.g. to route through a proxy client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<RpcClient, RpcError> {
        if self.reject_empty_credentials {
            check_credentials(&self.user, &self.password)?;
        }
        let config = ClientConfig::new(
            self.user,
            self.password,
            self.host,
            self.port,
            self.timeout,
            self.connect_timeout,
        )?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        sink.client_created(config.url());

        Ok(RpcClient {
            config,
            transport,
            sink,
            next_id: AtomicU64::new(0),
            stats: Mutex::new(CallStats::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::events::recording::RecordingSink;
    use crate::rpc::mock::MockTransport;

    fn client_with(mock: Arc<MockTransport>) -> (RpcClient, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let client = RpcClient::builder("alice", "secret")
            .transport(mock)
            .sink(sink.clone())
            .build()
            .expect("client must build");
        (client, sink)
    }

    #[tokio::test]
    async fn success_returns_envelope_and_counts() {
        let mock = Arc::new(
            MockTransport::new().with_reply(200, r#"{"result":850000,"error":null,"id":1}"#),
        );
        let (client, _) = client_with(mock.clone());

        let resp = client
            .call("getblockcount", Vec::new())
            .await
            .expect("call must succeed");
        assert_eq!(resp.result, json!(850000));
        assert!(resp.error.is_none());
        assert_eq!(
            client.stats(),
            CallStats {
                total: 1,
                success: 1,
                error: 0
            }
        );

        let sent = mock.requests();
        assert_eq!(
            sent[0],
            json!({"jsonrpc": "1.0", "id": 1, "method": "getblockcount", "params": []})
        );
    }

    #[tokio::test]
    async fn transport_failure_raises_connection_error() {
        let mock = Arc::new(MockTransport::new().with_transport_error("connection refused"));
        let (client, sink) = client_with(mock);

        let err = client
            .call("uptime", Vec::new())
            .await
            .expect_err("transport failure must raise");
        match &err {
            RpcError::Connection { url, message } => {
                assert_eq!(url, "http://127.0.0.1:8332/");
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected connection error, got {other:?}"),
        }
        assert!(err.to_string().contains("http://127.0.0.1:8332/"));
        assert_eq!(client.total_count(), 1);
        assert_eq!(client.error_count(), 1);
        assert_eq!(client.success_count(), 0);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1].phase,
            CallPhase::Failed {
                status: None,
                kind: ErrorKind::Connection,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_401_raises_auth_error() {
        let mock = Arc::new(MockTransport::new().with_reply(401, ""));
        let (client, _) = client_with(mock);

        let err = client
            .call("uptime", Vec::new())
            .await
            .expect_err("empty 401 must raise");
        assert!(matches!(err, RpcError::Auth(_)));
        assert_eq!(err.to_string(), AUTH_ERROR_MESSAGE);
        assert_eq!(client.stats().error, 1);
        assert_eq!(client.stats().total, 1);
    }

    #[tokio::test]
    async fn non_empty_401_is_decoded_not_raised_as_auth() {
        let mock = Arc::new(MockTransport::new().with_reply(
            401,
            r#"{"result":null,"error":{"code":-1,"message":"locked"},"id":1}"#,
        ));
        let (client, _) = client_with(mock);

        let resp = client
            .call("uptime", Vec::new())
            .await
            .expect("envelope must be passed through");
        assert_eq!(resp.error_kind(), Some(ErrorKind::Generic));
        assert_eq!(client.error_count(), 1);
    }

    #[tokio::test]
    async fn server_error_envelope_is_passed_through() {
        let body = r#"{"result":null,"error":{"code":-32601,"message":"Method not found"},"id":1}"#;
        let mock = Arc::new(MockTransport::new().with_reply(404, body));
        let (client, sink) = client_with(mock);

        let resp = client
            .call("nosuchmethod", Vec::new())
            .await
            .expect("server errors must not raise");
        let err = resp.error.as_ref().expect("error object must be set");
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
        assert_eq!(resp.result, Value::Null);
        assert_eq!(client.stats().error, 1);
        assert_eq!(client.stats().success, 0);

        let events = sink.events();
        match &events[1].phase {
            CallPhase::Failed {
                status,
                kind,
                message,
            } => {
                assert_eq!(*status, Some(404));
                assert_eq!(*kind, ErrorKind::MethodNotFound);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected failure event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn locally_recognized_codes_in_envelope_are_raised() {
        let mock = Arc::new(
            MockTransport::new()
                .with_reply(
                    500,
                    r#"{"result":null,"error":{"code":1,"message":"upstream unreachable"},"id":1}"#,
                )
                .with_reply(
                    500,
                    r#"{"result":null,"error":{"code":2,"message":"bad cookie"},"id":2}"#,
                ),
        );
        let (client, _) = client_with(mock);

        let first = client.call("uptime", Vec::new()).await.expect_err("code 1");
        match first {
            RpcError::Connection { message, .. } => assert_eq!(message, "upstream unreachable"),
            other => panic!("expected connection error, got {other:?}"),
        }
        let second = client.call("uptime", Vec::new()).await.expect_err("code 2");
        assert_eq!(second.to_string(), "bad cookie");
        assert_eq!(client.stats().error, 2);
        assert_eq!(client.stats().total, 2);
    }

    #[tokio::test]
    async fn undecodable_body_raises_invalid_response() {
        let mock = Arc::new(MockTransport::new().with_reply(502, "<html>Bad Gateway</html>"));
        let (client, _) = client_with(mock);

        let err = client
            .call("uptime", Vec::new())
            .await
            .expect_err("non-JSON body must raise");
        assert!(matches!(err, RpcError::InvalidResponse { status: 502, .. }));
        assert_eq!(client.stats().error, 1);
        assert_eq!(client.stats().total, 1);
    }

    #[tokio::test]
    async fn non_standard_error_member_raises_invalid_response() {
        let mock = Arc::new(MockTransport::new().with_reply(
            500,
            r#"{"result":null,"error":"Work queue depth exceeded","id":1}"#,
        ));
        let (client, sink) = client_with(mock);

        let err = client
            .call("getblockcount", Vec::new())
            .await
            .expect_err("string error member must raise");
        match &err {
            RpcError::InvalidResponse { status, message } => {
                assert_eq!(*status, 500);
                assert!(message.contains("Work queue depth exceeded"));
            }
            other => panic!("expected invalid response, got {other:?}"),
        }
        assert_eq!(client.stats().total, 1);
        assert_eq!(client.stats().error, 1);
        assert!(matches!(
            sink.events()[1].phase,
            CallPhase::Failed {
                status: Some(500),
                kind: ErrorKind::InvalidResponse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn repeated_calls_use_consecutive_ids() {
        let mock = Arc::new(
            MockTransport::new()
                .with_reply(200, r#"{"result":1,"error":null,"id":1}"#)
                .with_reply(200, r#"{"result":1,"error":null,"id":2}"#),
        );
        let (client, sink) = client_with(mock.clone());

        client.call("uptime", Vec::new()).await.expect("first");
        client.call("uptime", Vec::new()).await.expect("second");

        let ids: Vec<_> = mock.requests().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
        assert_eq!(client.total_count(), 2);

        let started: Vec<u64> = sink
            .events()
            .iter()
            .filter(|e| e.phase == CallPhase::Started)
            .map(|e| e.id)
            .collect();
        assert_eq!(started, vec![1, 2]);
    }

    #[tokio::test]
    async fn mixed_sequence_keeps_totals_consistent() {
        let mock = Arc::new(
            MockTransport::new()
                .with_reply(200, r#"{"result":"ok","error":null,"id":1}"#)
                .with_transport_error("connection reset")
                .with_reply(
                    500,
                    r#"{"result":null,"error":{"code":-8,"message":"Block height out of range"},"id":3}"#,
                )
                .with_reply(401, "")
                .with_reply(200, r#"{"result":"ok","error":null,"id":5}"#),
        );
        let (client, _) = client_with(mock);

        for _ in 0..5 {
            let _ = client.call("getblockhash", vec![json!(9_999_999)]).await;
            let stats = client.stats();
            assert_eq!(stats.total, stats.success + stats.error);
        }
        assert_eq!(
            client.stats(),
            CallStats {
                total: 5,
                success: 2,
                error: 3
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_calls_get_unique_ids_and_consistent_totals() {
        const CALLS: u64 = 200;

        let mock = (0..CALLS).fold(MockTransport::new(), |m, i| {
            if i % 3 == 2 {
                m.with_transport_error("connection reset by peer")
            } else {
                m.with_reply(200, r#"{"result":true,"error":null,"id":0}"#)
            }
        });
        let mock = Arc::new(mock);
        let (client, _) = client_with(mock.clone());
        let client = Arc::new(client);

        let handles: Vec<_> = (0..CALLS)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    let _ = client.call("getblockcount", Vec::new()).await;
                    let stats = client.stats();
                    assert_eq!(stats.total, stats.success + stats.error);
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("call task must not panic");
        }

        // 66 of the 200 queued replies are transport errors.
        assert_eq!(
            client.stats(),
            CallStats {
                total: CALLS,
                success: 134,
                error: 66
            }
        );

        let ids: HashSet<u64> = mock
            .requests()
            .iter()
            .map(|r| r["id"].as_u64().expect("id must be numeric"))
            .collect();
        assert_eq!(ids.len() as u64, CALLS);
        assert_eq!(ids, (1..=CALLS).collect::<HashSet<_>>());
    }

    #[test]
    fn construction_reports_url_and_starts_at_zero() {
        let sink = Arc::new(RecordingSink::default());
        let client = RpcClient::builder("alice", "secret")
            .host("10.0.0.5")
            .port(18443)
            .transport(Arc::new(MockTransport::new()))
            .sink(sink.clone())
            .build()
            .expect("client must build");

        assert_eq!(client.url(), "http://10.0.0.5:18443/");
        assert_eq!(sink.created(), vec!["http://10.0.0.5:18443/".to_owned()]);
        assert_eq!(client.stats(), CallStats::default());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn empty_credentials_accepted_unless_rejected() {
        let lenient = RpcClient::builder("", "")
            .transport(Arc::new(MockTransport::new()))
            .build();
        assert!(lenient.is_ok());

        let strict = RpcClient::builder("", "")
            .transport(Arc::new(MockTransport::new()))
            .reject_empty_credentials(true)
            .build();
        assert!(matches!(strict, Err(RpcError::Config(_))));
    }
}
