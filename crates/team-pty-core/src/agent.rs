//! Agent backends and their operating (permission) modes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// CLI agent a session drives on the remote PTY host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliBackend {
    /// Anthropic's claude CLI
    #[default]
    Claude,
    /// OpenAI's codex CLI
    Codex,
    /// Google's gemini CLI
    Gemini,
}

impl CliBackend {
    /// All supported backends.
    pub const ALL: [CliBackend; 3] = [Self::Claude, Self::Codex, Self::Gemini];

    /// Wire identifier of the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
        }
    }

    /// Permission modes the backend offers.
    pub fn permission_options(self) -> &'static [Permission] {
        match self {
            Self::Claude => &[
                Permission::Default,
                Permission::Plan,
                Permission::AutoEdit,
                Permission::FullAuto,
                Permission::BypassPermissions,
            ],
            Self::Codex => &[
                Permission::Default,
                Permission::Suggest,
                Permission::AutoEdit,
                Permission::FullAuto,
            ],
            Self::Gemini => &[Permission::Default, Permission::Yolo],
        }
    }

    /// Whether the backend offers the given permission mode.
    pub fn supports(self, permission: Permission) -> bool {
        self.permission_options().contains(&permission)
    }

    /// Mode used for unattended operation when no explicit mode is chosen.
    pub fn unattended_permission(self) -> Permission {
        match self {
            Self::Claude => Permission::BypassPermissions,
            Self::Codex => Permission::FullAuto,
            Self::Gemini => Permission::Yolo,
        }
    }

    /// Resolve the permission actually sent with a structured command.
    ///
    /// An explicit non-default choice wins; `Default` falls back to the
    /// backend's unattended mode.
    pub fn resolve_permission(self, selected: Permission) -> Permission {
        if selected == Permission::Default {
            self.unattended_permission()
        } else {
            selected
        }
    }
}

impl FromStr for CliBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            "gemini" => Ok(Self::Gemini),
            other => Err(Error::InvalidInput(format!("unknown CLI backend: {other}"))),
        }
    }
}

impl std::fmt::Display for CliBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating mode selected for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Backend's own default, resolved to the unattended mode on send
    #[default]
    Default,
    /// Plan-only mode
    Plan,
    /// Suggest changes without applying them
    Suggest,
    /// Apply edits without confirmation
    AutoEdit,
    /// Fully automatic operation
    FullAuto,
    /// Skip all permission prompts
    BypassPermissions,
    /// Gemini's approve-everything mode
    Yolo,
}

impl Permission {
    /// Wire identifier of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Plan => "plan",
            Self::Suggest => "suggest",
            Self::AutoEdit => "auto-edit",
            Self::FullAuto => "full-auto",
            Self::BypassPermissions => "bypass-permissions",
            Self::Yolo => "yolo",
        }
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "plan" => Ok(Self::Plan),
            "suggest" => Ok(Self::Suggest),
            "auto-edit" => Ok(Self::AutoEdit),
            "full-auto" => Ok(Self::FullAuto),
            "bypass-permissions" | "bypass" => Ok(Self::BypassPermissions),
            "yolo" => Ok(Self::Yolo),
            other => Err(Error::InvalidInput(format!("unknown permission: {other}"))),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
