//! Initialization command sent when a session becomes ready.

use std::time::Duration;

use team_pty_core::{HandshakeSettings, HandshakeStrategyKind};

/// How a session is initialized on the transition to `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeStrategy {
    /// Send one structured command carrying `message`, tagged with the
    /// session's backend and resolved permission.
    Priming {
        /// Operator-style text sent after the settings preamble
        message: String,
    },
    /// Type `line` followed by `\r\n` after `delay`.
    Keystroke {
        /// Line typed into the remote shell
        line: String,
        /// Delay before typing
        delay: Duration,
    },
}

impl HandshakeStrategy {
    /// Priming strategy with the given message.
    pub fn priming(message: impl Into<String>) -> Self {
        Self::Priming {
            message: message.into(),
        }
    }

    /// Keystroke strategy.
    pub fn keystroke(line: impl Into<String>, delay: Duration) -> Self {
        Self::Keystroke {
            line: line.into(),
            delay,
        }
    }

    /// Delay before the initialization command goes out.
    pub fn delay(&self) -> Duration {
        match self {
            Self::Priming { .. } => Duration::ZERO,
            Self::Keystroke { delay, .. } => *delay,
        }
    }
}

impl Default for HandshakeStrategy {
    fn default() -> Self {
        Self::from(&HandshakeSettings::default())
    }
}

impl From<&HandshakeSettings> for HandshakeStrategy {
    fn from(settings: &HandshakeSettings) -> Self {
        match settings.strategy {
            HandshakeStrategyKind::Priming => Self::priming(settings.priming_message.clone()),
            HandshakeStrategyKind::Keystroke => Self::keystroke(
                settings.keystroke.clone(),
                Duration::from_millis(settings.keystroke_delay_ms),
            ),
        }
    }
}
