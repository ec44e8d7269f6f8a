//! # team-pty-classifier
//!
//! Output classification for team-pty.
//!
//! This crate turns raw terminal text into displayable text:
//! - Control-sequence stripping (CSI, OSC, shift-in/shift-out)
//! - Drop filters for noise, gibberish, trivial and setup-echo lines
//! - Role-line extraction for named participants
//! - The composed [`OutputPipeline`]
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on team-pty-core
//! and is driven by the session runtime for every content frame.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod filters;
pub mod pipeline;
pub mod role;
pub mod strip;

// Re-export commonly used types
pub use filters::{
    clean_line, is_gibberish, is_noise, is_setup_echo, is_trivial_text, TEAM_SETTINGS_MARKER,
};
pub use pipeline::{ClassifiedOutput, OutputPipeline};
pub use role::{looks_like_agent_prompt, parse_role_line, RoleLine, RoleLineParser};
pub use strip::strip_control_sequences;
