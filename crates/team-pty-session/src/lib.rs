//! # team-pty-session
//!
//! Session runtime for team-pty.
//!
//! This crate provides:
//! - Session State and the Session Registry that owns it
//! - The connection lifecycle controller (connect, handshake, close, error)
//! - The dispatcher for targeted and broadcast sends
//! - The transport seam and its WebSocket implementation
//! - Output sinks and the operator transcript
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on team-pty-core,
//! team-pty-protocol and team-pty-classifier to manage agent session
//! lifecycles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod dispatcher;
pub mod handshake;
pub mod lifecycle;
pub mod output;
pub mod registry;
pub mod session;
pub mod testing;
pub mod transport;

// Re-export commonly used types
pub use command::{normalize_operator_text, settings_prefix, structured_data};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use handshake::HandshakeStrategy;
pub use lifecycle::LifecycleController;
pub use output::{OutputLog, OutputSink, SharedOutputLog, LOCAL_ECHO_PREFIX};
pub use registry::{Selection, SessionRegistry, Transition};
pub use session::{ConnectTarget, SessionSnapshot, SessionState};
pub use transport::{
    event_channel, Connector, EventKind, EventReceiver, EventSender, SessionEvent, Transport,
    WsConnector,
};
