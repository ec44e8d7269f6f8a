//! Session identifiers and the lifecycle phase machine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one logical agent terminal.
///
/// Persisted members map to `m-<member id>`; members without a persisted id
/// get a synthesized `<role>-<name>-<suffix>` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Session id for a member the collaborator API has persisted.
    pub fn for_member(member_id: i64) -> Self {
        Self(format!("m-{member_id}"))
    }

    /// Synthesize a process-unique id for a member without a persisted id.
    pub fn synthesize(role: &str, name: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{role}-{name}-{}", &suffix[..8]))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of a session.
///
/// `Idle` is never stored: it is the phase of a session id with no entry in
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session state exists
    Idle,
    /// Transport is opening
    Connecting,
    /// Transport open, waiting for the remote readiness signal
    AwaitingHandshake,
    /// Handshake complete, input may flow both ways
    Ready,
    /// Transport closed
    Closed,
    /// Transport failed
    Errored,
}

/// Signals that drive a session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    /// A connect request was accepted
    Connect,
    /// The transport reported it is open
    Opened,
    /// The remote host sent `ws_ready` or `shell_ready`
    HandshakeReady,
    /// Explicit disconnect or remote close
    Closed,
    /// The transport reported an error
    Failed,
}

impl SessionPhase {
    /// Terminal phases are never left.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Phases in which a transport exists.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::AwaitingHandshake | Self::Ready
        )
    }

    /// The single transition function of the lifecycle.
    ///
    /// Returns `None` when the signal does not move the session, which the
    /// caller treats as a no-op (duplicate open signals, repeated readiness
    /// frames, signals arriving after a terminal phase).
    pub fn next(self, signal: PhaseSignal) -> Option<SessionPhase> {
        use PhaseSignal as S;
        use SessionPhase as P;

        match (self, signal) {
            (P::Idle, S::Connect) => Some(P::Connecting),
            (P::Connecting, S::Opened) => Some(P::AwaitingHandshake),
            // A readiness frame proves the transport is open even if the
            // open signal has not been observed yet.
            (P::Connecting | P::AwaitingHandshake, S::HandshakeReady) => Some(P::Ready),
            (P::Connecting | P::AwaitingHandshake | P::Ready, S::Closed) => Some(P::Closed),
            (P::Connecting | P::AwaitingHandshake | P::Ready, S::Failed) => Some(P::Errored),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(label)
    }
}
