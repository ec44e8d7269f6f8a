//! # team-pty-protocol
//!
//! Wire protocol for team-pty sessions.
//!
//! This crate provides:
//! - Outbound frames (`input`, `resize`) and their JSON encoding
//! - Inbound frame decoding (`ws_ready`, `shell_ready`, `terminal`) with a
//!   plain-text fallback for anything else
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on team-pty-core and is
//! used by the session runtime to talk to the remote PTY host.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;

// Re-export commonly used types
pub use codec::{decode, InboundFrame, OutboundFrame, LINE_ENDING};
