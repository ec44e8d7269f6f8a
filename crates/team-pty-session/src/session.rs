//! Session State: one record per logical agent terminal.

use chrono::{DateTime, Utc};

use team_pty_classifier::RoleLineParser;
use team_pty_core::{CliBackend, Member, MemberRole, Permission, SessionId, SessionPhase, Team};

use crate::transport::Transport;

/// Everything needed to open a session for a team member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// Session id of the member
    pub session_id: SessionId,
    /// Display name, also the participant name for role lines
    pub display_name: String,
    /// Role tag
    pub role: MemberRole,
    /// Team settings path used in structured command preambles
    pub settings_path: String,
}

impl ConnectTarget {
    /// Target for `member` of `team`, addressed as `session_id`.
    pub fn for_member(session_id: SessionId, member: &Member, team: &Team) -> Self {
        Self {
            session_id,
            display_name: member.name.clone(),
            role: member.role.clone(),
            settings_path: team.config_path().to_string(),
        }
    }
}

/// Live runtime state of one session. Owned by the registry.
pub struct SessionState {
    id: SessionId,
    display_name: String,
    role: MemberRole,
    settings_path: String,
    pub(crate) cli: CliBackend,
    pub(crate) permission: Permission,
    phase: SessionPhase,
    generation: u64,
    pub(crate) transport: Option<Box<dyn Transport>>,
    pub(crate) handshake_completed: bool,
    pub(crate) agent_prompt_seen: bool,
    pub(crate) last_reply: Option<String>,
    participant: RoleLineParser,
    created_at: DateTime<Utc>,
}

impl SessionState {
    pub(crate) fn new(
        target: &ConnectTarget,
        cli: CliBackend,
        permission: Permission,
        generation: u64,
    ) -> Self {
        Self {
            id: target.session_id.clone(),
            display_name: target.display_name.clone(),
            role: target.role.clone(),
            settings_path: target.settings_path.clone(),
            cli,
            permission,
            phase: SessionPhase::Idle,
            generation,
            transport: None,
            handshake_completed: false,
            agent_prompt_seen: false,
            last_reply: None,
            participant: RoleLineParser::new(&target.display_name),
            created_at: Utc::now(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Role tag.
    pub fn role(&self) -> &MemberRole {
        &self.role
    }

    /// Team settings path put in front of every structured command.
    ///
    /// Starts as the path known at connect time and follows roster refreshes
    /// through [`set_settings_path`](Self::set_settings_path).
    pub fn settings_path(&self) -> &str {
        &self.settings_path
    }

    pub(crate) fn set_settings_path(&mut self, path: &str) {
        self.settings_path = path.to_string();
    }

    /// Selected backend.
    pub fn cli(&self) -> CliBackend {
        self.cli
    }

    /// Selected permission, possibly `Default`.
    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Permission sent with structured commands.
    pub fn resolved_permission(&self) -> Permission {
        self.cli.resolve_permission(self.permission)
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Only the registry moves a session between phases.
    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    /// Generation of this Session State; its transport's events carry it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the initialization command has gone out.
    pub fn handshake_completed(&self) -> bool {
        self.handshake_completed
    }

    /// Latest `<name>:` line the participant spoke.
    pub fn last_reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }

    /// Role-line parser for the participant.
    pub fn participant(&self) -> &RoleLineParser {
        &self.participant
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Point-in-time copy for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            display_name: self.display_name.clone(),
            role: self.role.clone(),
            cli: self.cli,
            permission: self.permission,
            phase: self.phase,
            handshake_completed: self.handshake_completed,
            agent_prompt_seen: self.agent_prompt_seen,
            last_reply: self.last_reply.clone(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("cli", &self.cli)
            .field("permission", &self.permission)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("has_transport", &self.transport.is_some())
            .field("handshake_completed", &self.handshake_completed)
            .finish()
    }
}

/// Information about a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session ID
    pub session_id: SessionId,
    /// Display name
    pub display_name: String,
    /// Role tag
    pub role: MemberRole,
    /// Selected backend
    pub cli: CliBackend,
    /// Selected permission
    pub permission: Permission,
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Whether the initialization command has gone out
    pub handshake_completed: bool,
    /// Whether the agent CLI's startup prompt has been seen
    pub agent_prompt_seen: bool,
    /// Latest line the participant spoke
    pub last_reply: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
