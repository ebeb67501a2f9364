pub mod config;
pub mod error;
pub mod events;
pub mod methods;
pub mod rpc;
pub mod util;

pub use config::ClientConfig;
pub use error::{classify, ErrorKind, RpcError};
pub use events::{CallEvent, CallPhase, CallSink, NoopSink, TracingSink};
pub use methods::{BlockRef, MemoryInfoMode};
pub use rpc::{CallStats, RpcClient, RpcResponse};
