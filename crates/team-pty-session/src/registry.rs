//! Session Registry: the single owner of all Session State.

use std::collections::HashMap;

use tracing::{debug, info};

use team_pty_core::{
    CliBackend, Error, Permission, PhaseSignal, Result, SessionId, SessionPhase,
};

use crate::session::{ConnectTarget, SessionSnapshot, SessionState};

/// Backend and permission chosen for a session id, connected or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Chosen backend; the registry default when unset
    pub cli: Option<CliBackend>,
    /// Chosen permission
    pub permission: Permission,
}

/// A phase change applied by the registry.
#[derive(Debug)]
pub struct Transition {
    /// Phase before the signal
    pub from: SessionPhase,
    /// Phase after the signal
    pub to: SessionPhase,
    /// The removed Session State when `to` is terminal
    pub ended: Option<SessionState>,
}

/// Mapping from session id to Session State.
///
/// At most one Session State exists per id, and every stored state is in a
/// live phase: entries reaching `Closed` or `Errored` are removed in the
/// same call that moves them there.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionState>,
    selections: HashMap<SessionId, Selection>,
    default_cli: CliBackend,
    next_generation: u64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(default_cli: CliBackend) -> Self {
        Self {
            sessions: HashMap::new(),
            selections: HashMap::new(),
            default_cli,
            next_generation: 1,
        }
    }

    /// Backend used when nothing was selected.
    pub fn default_cli(&self) -> CliBackend {
        self.default_cli
    }

    /// Create the Session State for a connect request and move it to
    /// `Connecting`.
    ///
    /// Returns `None` when a Session State for the id already exists.
    pub fn begin(&mut self, target: &ConnectTarget) -> Option<&mut SessionState> {
        if self.sessions.contains_key(&target.session_id) {
            debug!(
                "Session already live, connect is a no-op: id={}",
                target.session_id
            );
            return None;
        }

        let selection = self.selection(&target.session_id);
        let generation = self.next_generation;
        self.next_generation += 1;

        let mut state = SessionState::new(
            target,
            selection.cli.unwrap_or(self.default_cli),
            selection.permission,
            generation,
        );
        let phase = state.phase().next(PhaseSignal::Connect)?;
        state.set_phase(phase);

        info!(
            "Session created: id={}, name={}, cli={}, generation={}",
            target.session_id, target.display_name, state.cli(), generation
        );
        Some(
            self.sessions
                .entry(target.session_id.clone())
                .or_insert(state),
        )
    }

    /// Apply a lifecycle signal.
    ///
    /// Returns `None` when the id is unknown or the signal does not move the
    /// session. A transition into a terminal phase removes the entry and
    /// hands it back in [`Transition::ended`].
    pub fn transition(&mut self, id: &SessionId, signal: PhaseSignal) -> Option<Transition> {
        let state = self.sessions.get_mut(id)?;
        let from = state.phase();
        let to = from.next(signal)?;
        state.set_phase(to);
        info!("Session phase: id={}, {} -> {}", id, from, to);

        let ended = if to.is_terminal() {
            self.sessions.remove(id)
        } else {
            None
        };
        Some(Transition { from, to, ended })
    }

    /// Get a session by ID.
    pub fn get(&self, id: &SessionId) -> Option<&SessionState> {
        self.sessions.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &SessionId) -> Option<&mut SessionState> {
        self.sessions.get_mut(id)
    }

    /// Phase of a session; `Idle` when no Session State exists.
    pub fn phase(&self, id: &SessionId) -> SessionPhase {
        self.sessions
            .get(id)
            .map(SessionState::phase)
            .unwrap_or(SessionPhase::Idle)
    }

    /// Whether a Session State exists for the id.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Ids of all stored sessions, sorted.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshots of all stored sessions, sorted by id.
    pub fn list(&self) -> Vec<SessionSnapshot> {
        let mut list: Vec<SessionSnapshot> =
            self.sessions.values().map(SessionState::snapshot).collect();
        list.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        list
    }

    /// Get the number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remembered selection for an id.
    pub fn selection(&self, id: &SessionId) -> Selection {
        self.selections.get(id).copied().unwrap_or_default()
    }

    /// Backend a session uses, or would use once connected.
    pub fn cli_for(&self, id: &SessionId) -> CliBackend {
        match self.sessions.get(id) {
            Some(state) => state.cli(),
            None => self.selection(id).cli.unwrap_or(self.default_cli),
        }
    }

    /// Select a backend.
    ///
    /// A permission the new backend does not offer is reset to `Default`.
    pub fn select_cli(&mut self, id: &SessionId, cli: CliBackend) {
        let selection = self.selections.entry(id.clone()).or_default();
        selection.cli = Some(cli);
        if !cli.supports(selection.permission) {
            debug!(
                "Permission {} not offered by {}, reset to default: id={}",
                selection.permission, cli, id
            );
            selection.permission = Permission::Default;
        }
        let selection = *selection;

        if let Some(state) = self.sessions.get_mut(id) {
            state.cli = cli;
            state.permission = selection.permission;
        }
    }

    /// Select a permission; it must be offered by the session's backend.
    pub fn select_permission(&mut self, id: &SessionId, permission: Permission) -> Result<()> {
        let cli = self.cli_for(id);
        if !cli.supports(permission) {
            return Err(Error::InvalidInput(format!(
                "{cli} does not offer permission {permission}"
            )));
        }

        self.selections.entry(id.clone()).or_default().permission = permission;
        if let Some(state) = self.sessions.get_mut(id) {
            state.permission = permission;
        }
        Ok(())
    }

    /// Forget the remembered selection for an id.
    pub fn forget(&mut self, id: &SessionId) {
        self.selections.remove(id);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(CliBackend::default())
    }
}
