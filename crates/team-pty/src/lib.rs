//! # team-pty
//!
//! Control surface for a team of remote agent terminals.
//!
//! This crate provides:
//! - The collaborator API client (teams, projects, members)
//! - Signed-in user lookup
//! - The team roster and its session IDs
//! - Operator command parsing
//! - The runtime loop tying commands and transport events together
//!
//! ## Architecture
//!
//! This is Layer 3 in the architecture - the application binary built on
//! team-pty-session and team-pty-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod commands;
pub mod roster;
pub mod runtime;

// Re-export commonly used types
pub use api::ApiClient;
pub use auth::load_user_id;
pub use commands::{Command, SendTarget};
pub use roster::{Roster, RosterMember};
pub use runtime::{run, App, Flow};
