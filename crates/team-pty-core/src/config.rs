//! Runtime configuration for team-pty.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CliBackend, Error};

/// Environment variable overriding `server.ws_url`.
pub const WS_URL_ENV: &str = "TEAM_PTY_WS_URL";

/// Runtime configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Remote endpoints
    pub server: ServerSettings,
    /// Handshake behaviour
    pub handshake: HandshakeSettings,
    /// Output classification
    pub output: OutputSettings,
    /// Per-session defaults
    pub defaults: DefaultsSettings,
    /// Signed-in user source
    pub auth: AuthSettings,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            handshake: HandshakeSettings::default(),
            output: OutputSettings::default(),
            defaults: DefaultsSettings::default(),
            auth: AuthSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let mut config: RuntimeConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        if config.log_level.is_empty() {
            config.log_level = default_log_level();
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(WS_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.server.ws_url = url.to_string();
            }
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        let ws = self.server.ws_url.trim();
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "server.ws_url must be a ws:// or wss:// url, got '{ws}'"
            )));
        }

        let api = self.server.api_base_url.trim();
        if !(api.starts_with("http://") || api.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server.api_base_url must be an http:// or https:// url, got '{api}'"
            )));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(Error::Config(
                "server.request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.handshake.strategy == HandshakeStrategyKind::Keystroke
            && self.handshake.keystroke.trim().is_empty()
        {
            return Err(Error::Config(
                "handshake.keystroke cannot be empty for the keystroke strategy".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Remote endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// WebSocket endpoint of the remote PTY host
    pub ws_url: String,
    /// Base url of the collaborator HTTP API
    pub api_base_url: String,
    /// Timeout for collaborator API requests, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8080/ws/terminal".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 20,
        }
    }
}

/// Which initialization command a session sends once it becomes ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStrategyKind {
    /// Structured priming message built from the backend and team settings path
    #[default]
    Priming,
    /// Delayed identifier keystroke line (e.g. `claude\r\n`)
    Keystroke,
}

/// Handshake settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeSettings {
    /// Strategy applied on the transition to ready
    pub strategy: HandshakeStrategyKind,
    /// Text of the priming message
    pub priming_message: String,
    /// Line typed by the keystroke strategy
    pub keystroke: String,
    /// Delay before the keystroke line is sent, in milliseconds
    pub keystroke_delay_ms: u64,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            strategy: HandshakeStrategyKind::Priming,
            priming_message: "Let's pick today's meeting back up!".to_string(),
            keystroke: "claude".to_string(),
            keystroke_delay_ms: 3000,
        }
    }
}

/// How inbound text is filtered before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Only strip control sequences
    StripOnly,
    /// Strip, then drop noise, gibberish, trivial and setup-echo lines
    #[default]
    Filtered,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Filter mode
    pub filter: FilterMode,
}

/// Defaults applied to new sessions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DefaultsSettings {
    /// Backend selected for a session nobody configured
    pub cli: CliBackend,
}

/// Signed-in user source.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthSettings {
    /// JSON file holding the signed-in user (`{"id": ...}`)
    pub user_file: Option<PathBuf>,
}
