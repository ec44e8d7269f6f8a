//! Envelope codec for the session wire protocol.
//!
//! Outbound frames:
//!
//! ```text
//! { "type": "input", "data": "...", "cli"?: "...", "permission"?: "..." }
//! { "type": "resize", "cols": 120, "rows": 40 }
//! ```
//!
//! Inbound frames are `ws_ready`, `shell_ready` and `terminal` (with a `data`
//! string). Anything else is plain terminal output.

use serde::Deserialize;
use serde_json::json;
use tracing::trace;

use team_pty_core::{CliBackend, Permission};

/// Line terminator appended when a whole line is typed into the remote shell.
pub const LINE_ENDING: &str = "\r\n";

/// A command sent to the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Text for the remote shell.
    ///
    /// `cli` and `permission` are present only on structured commands; raw
    /// keystroke passthrough carries neither.
    Input {
        /// Text payload
        data: String,
        /// Backend the command is addressed to
        cli: Option<CliBackend>,
        /// Operating mode for the backend
        permission: Option<Permission>,
    },
    /// Viewport size change
    Resize {
        /// Column count (> 1)
        cols: u16,
        /// Row count (> 1)
        rows: u16,
    },
}

impl OutboundFrame {
    /// Raw keystrokes, passed through untouched.
    pub fn keystrokes(data: impl Into<String>) -> Self {
        Self::Input {
            data: data.into(),
            cli: None,
            permission: None,
        }
    }

    /// A full line typed into the remote shell.
    pub fn line(text: &str) -> Self {
        Self::keystrokes(format!("{text}{LINE_ENDING}"))
    }

    /// A structured command tagged with the recipient's backend and mode.
    pub fn command(data: impl Into<String>, cli: CliBackend, permission: Permission) -> Self {
        Self::Input {
            data: data.into(),
            cli: Some(cli),
            permission: Some(permission),
        }
    }

    /// A resize frame, or `None` for degenerate sizes.
    ///
    /// Both dimensions must be greater than 1; zero-size viewports show up
    /// transiently while a layout settles and must never reach the host.
    pub fn resize(cols: u16, rows: u16) -> Option<Self> {
        if cols > 1 && rows > 1 {
            Some(Self::Resize { cols, rows })
        } else {
            None
        }
    }

    /// Whether this frame is a structured command.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Input { cli: Some(_), .. })
    }

    /// Encode to the JSON text sent on the transport.
    pub fn encode(&self) -> String {
        let value = match self {
            Self::Input {
                data,
                cli,
                permission,
            } => {
                let mut value = json!({ "type": "input", "data": data });
                if let Some(cli) = cli {
                    value["cli"] = json!(cli.as_str());
                }
                if let Some(permission) = permission {
                    value["permission"] = json!(permission.as_str());
                }
                value
            }
            Self::Resize { cols, rows } => json!({ "type": "resize", "cols": cols, "rows": rows }),
        };
        value.to_string()
    }
}

/// A frame received from the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// The host's websocket side is ready
    WsReady,
    /// The host's shell is ready
    ShellReady,
    /// Terminal output
    Terminal {
        /// Raw terminal text (may contain escape sequences)
        data: String,
    },
    /// Payload that is not a recognized frame; still usable output
    Plain(String),
}

impl InboundFrame {
    /// Whether this frame signals remote readiness.
    pub fn is_readiness(&self) -> bool {
        matches!(self, Self::WsReady | Self::ShellReady)
    }

    /// Displayable text carried by the frame, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Terminal { data } => Some(data),
            Self::Plain(text) => Some(text),
            Self::WsReady | Self::ShellReady => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireFrame {
    WsReady,
    ShellReady,
    Terminal { data: String },
}

/// Decode one inbound payload. Never fails: unparsable payloads come back as
/// [`InboundFrame::Plain`] holding the original text.
pub fn decode(raw: &str) -> InboundFrame {
    match serde_json::from_str::<WireFrame>(raw) {
        Ok(WireFrame::WsReady) => InboundFrame::WsReady,
        Ok(WireFrame::ShellReady) => InboundFrame::ShellReady,
        Ok(WireFrame::Terminal { data }) => InboundFrame::Terminal { data },
        Err(e) => {
            trace!("Inbound payload is not a frame ({}), treating as plain text", e);
            InboundFrame::Plain(raw.to_string())
        }
    }
}
