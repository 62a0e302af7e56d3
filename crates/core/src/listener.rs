//! Callbacks from the client core to its collaborators (renderer,
//! notification surface).

use crate::protocol::DescribeInfo;
use crate::session::SessionState;

/// Conditions reported once to the notification surface. Each is fatal to
/// the session and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalCondition {
    #[error("connection to '{addr}' failed: {reason}")]
    ConnectFailed { addr: String, reason: String },

    #[error("unable to bind PORT={port}: {reason}")]
    BindFailed { port: u16, reason: String },

    #[error("resource '{resource}' not found on server")]
    FileNotFound { resource: String },
}

/// Receives events from the client's worker threads.
///
/// Called from the control and data threads with no session lock held.
/// Every method has a no-op default, so implementors pick what they need.
pub trait SessionListener: Send + Sync {
    /// An in-order frame was accepted by the receive pipeline.
    fn on_frame(&self, _sequence: u16, _payload: &[u8]) {}

    fn on_state_changed(&self, _state: SessionState) {}

    fn on_describe_info(&self, _info: &DescribeInfo) {}

    fn on_fatal(&self, _condition: &FatalCondition) {}
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SessionListener for NoopListener {}
