//! # team-pty-core
//!
//! Core types for team-pty.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other team-pty crates. It provides:
//!
//! - Session identifiers and lifecycle phases
//! - Agent backends and their permission modes
//! - Team, member and project records served by the collaborator API
//! - Runtime configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other team-pty crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod config;
pub mod error;
pub mod session;
pub mod team;

// Re-export commonly used types
pub use agent::{CliBackend, Permission};
pub use config::{
    AuthSettings, DefaultsSettings, FilterMode, HandshakeSettings, HandshakeStrategyKind,
    OutputSettings, RuntimeConfig, ServerSettings,
};
pub use error::{Error, Result};
pub use session::{PhaseSignal, SessionId, SessionPhase};
pub use team::{Member, MemberRole, Project, Team};
