//! Structured call events and the sinks that receive them.
//!
//! The client never logs directly. It hands a [`CallEvent`] to the
//! [`CallSink`] it was built with; [`TracingSink`] is the default.

use std::time::SystemTime;

use tracing::{error, info};

use crate::error::ErrorKind;

// ==============================================================================
// Events
// ==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CallEvent {
    pub timestamp: SystemTime,
    pub id: u64,
    pub method: String,
    pub phase: CallPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallPhase {
    Started,
    Succeeded {
        status: u16,
    },
    /// `status` is `None` when no HTTP response was received.
    Failed {
        status: Option<u16>,
        kind: ErrorKind,
        message: String,
    },
}

impl CallEvent {
    pub(crate) fn new(id: u64, method: &str, phase: CallPhase) -> Self {
        Self {
            timestamp: SystemTime::now(),
            id,
            method: method.to_owned(),
            phase,
        }
    }
}

// ==============================================================================
// Sinks
// ==============================================================================

/// Receiver for client events. Implementations must not block for long:
/// events are delivered inline on the calling task.
pub trait CallSink: Send + Sync {
    /// Called once when a client has been constructed.
    fn client_created(&self, url: &str) {
        let _ = url;
    }

    fn record(&self, event: &CallEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl CallSink for TracingSink {
    fn client_created(&self, url: &str) {
        info!(rpc.url = url, "rpc client created");
    }

    fn record(&self, event: &CallEvent) {
        match &event.phase {
            CallPhase::Started => {
                info!(rpc.id = event.id, rpc.method = %event.method, "rpc call start");
            }
            CallPhase::Succeeded { status } => {
                info!(rpc.id = event.id, rpc.method = %event.method, status, "rpc call success");
            }
            CallPhase::Failed {
                status,
                kind,
                message,
            } => {
                error!(
                    rpc.id = event.id,
                    rpc.method = %event.method,
                    status = ?status,
                    %kind,
                    message = %message,
                    "rpc call error"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl CallSink for NoopSink {
    fn record(&self, _event: &CallEvent) {}
}
