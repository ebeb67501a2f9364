//! Bitcoin Core JSON-RPC call pipeline.
//!
//! [`RpcClient`] owns the endpoint configuration, the call-id sequence and
//! the call counters. Requests reach the daemon through a [`Transport`];
//! [`HttpTransport`] is the `reqwest` implementation and `mock::MockTransport`
//! replaces it in unit tests.

mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod protocol;
pub mod transport;

pub use client::{CallStats, RpcClient, RpcClientBuilder};
pub use protocol::{JsonRpcRequest, RpcErrorObject, RpcResponse};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
