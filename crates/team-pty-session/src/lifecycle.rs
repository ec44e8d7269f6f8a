//! Connection Lifecycle Controller.
//!
//! Drives every session through `Connecting -> AwaitingHandshake -> Ready`
//! and into `Closed` or `Errored`. Transport events are consumed one at a
//! time, in the order they were queued; all phase changes go through the
//! registry's single transition function.

use std::sync::Arc;

use tracing::{debug, info, warn};

use team_pty_classifier::OutputPipeline;
use team_pty_core::{
    CliBackend, Permission, PhaseSignal, Result, RuntimeConfig, SessionId, SessionPhase,
};
use team_pty_protocol::{decode, InboundFrame, OutboundFrame};

use crate::command::structured_data;
use crate::dispatcher::Dispatcher;
use crate::handshake::HandshakeStrategy;
use crate::output::OutputSink;
use crate::registry::{SessionRegistry, Transition};
use crate::session::{ConnectTarget, SessionSnapshot, SessionState};
use crate::transport::{Connector, EventKind, EventSender, SessionEvent};

/// Owns the registry and reacts to connect requests and transport events.
pub struct LifecycleController {
    registry: SessionRegistry,
    connector: Arc<dyn Connector>,
    events: EventSender,
    handshake: HandshakeStrategy,
    pipeline: OutputPipeline,
    sink: Arc<dyn OutputSink>,
}

impl LifecycleController {
    /// Create a controller.
    ///
    /// Transports post their events to `events`; the caller feeds them back
    /// through [`handle_event`](Self::handle_event).
    pub fn new(
        connector: Arc<dyn Connector>,
        events: EventSender,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            registry: SessionRegistry::default(),
            connector,
            events,
            handshake: HandshakeStrategy::default(),
            pipeline: OutputPipeline::default(),
            sink,
        }
    }

    /// Create a controller configured from the runtime configuration.
    pub fn from_config(
        config: &RuntimeConfig,
        connector: Arc<dyn Connector>,
        events: EventSender,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self::new(connector, events, sink)
            .with_handshake(HandshakeStrategy::from(&config.handshake))
            .with_pipeline(OutputPipeline::new(config.output.filter))
            .with_default_cli(config.defaults.cli)
    }

    /// Use the given handshake strategy.
    pub fn with_handshake(mut self, handshake: HandshakeStrategy) -> Self {
        self.handshake = handshake;
        self
    }

    /// Use the given output pipeline.
    pub fn with_pipeline(mut self, pipeline: OutputPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Backend for sessions nobody configured.
    pub fn with_default_cli(mut self, cli: CliBackend) -> Self {
        self.registry = SessionRegistry::new(cli);
        self
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Phase of a session; `Idle` when it has no Session State.
    pub fn phase(&self, id: &SessionId) -> SessionPhase {
        self.registry.phase(id)
    }

    /// Snapshot of one session.
    pub fn snapshot(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.registry.get(id).map(SessionState::snapshot)
    }

    /// Snapshots of all live sessions.
    pub fn sessions(&self) -> Vec<SessionSnapshot> {
        self.registry.list()
    }

    /// Dispatcher bound to this controller.
    pub fn dispatcher(&mut self) -> Dispatcher<'_> {
        Dispatcher::new(self)
    }

    /// Connect a session.
    ///
    /// Idempotent: a connect for an id that already has a live Session State
    /// does nothing and returns `false`. Returns `true` when a transport was
    /// opened.
    pub fn connect(&mut self, target: &ConnectTarget) -> bool {
        let Some(state) = self.registry.begin(target) else {
            return false;
        };
        let generation = state.generation();
        let id = target.session_id.clone();

        match self.connector.open(&id, generation, self.events.clone()) {
            Ok(transport) => {
                if let Some(state) = self.registry.get_mut(&id) {
                    state.transport = Some(transport);
                }
                self.report(&id, &target.display_name, SessionPhase::Connecting);
                true
            }
            Err(e) => {
                warn!("Connect failed: id={}, error={}", id, e);
                self.apply(&id, PhaseSignal::Failed);
                false
            }
        }
    }

    /// Close a session. Returns `false` when it had no Session State.
    pub fn disconnect(&mut self, id: &SessionId) -> bool {
        self.apply(id, PhaseSignal::Closed).is_some()
    }

    /// Close every live session.
    pub fn disconnect_all(&mut self) -> usize {
        let ids = self.registry.ids();
        let count = ids.len();
        for id in ids {
            self.disconnect(&id);
        }
        if count > 0 {
            info!("Closed all sessions: count={}", count);
        }
        count
    }

    /// Close a session and forget its selections (member deleted).
    pub fn remove(&mut self, id: &SessionId) {
        self.disconnect(id);
        self.registry.forget(id);
    }

    /// Point a live session at its team's current settings path.
    ///
    /// Returns `false` when the session has no Session State.
    pub fn set_settings_path(&mut self, id: &SessionId, path: &str) -> bool {
        match self.registry.get_mut(id) {
            Some(state) => {
                if state.settings_path() != path {
                    debug!("Settings path updated: id={}, path={}", id, path);
                    state.set_settings_path(path);
                }
                true
            }
            None => false,
        }
    }

    /// Select a session's backend, connected or not.
    pub fn set_cli(&mut self, id: &SessionId, cli: CliBackend) {
        self.registry.select_cli(id, cli);
    }

    /// Select a session's permission, connected or not.
    pub fn set_permission(&mut self, id: &SessionId, permission: Permission) -> Result<()> {
        self.registry.select_permission(id, permission)
    }

    /// React to one transport event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        let SessionEvent {
            session_id,
            generation,
            kind,
        } = event;

        match self.registry.get(&session_id) {
            Some(state) if state.generation() == generation => {}
            _ => {
                debug!(
                    "Ignoring stale transport event: id={}, generation={}, event={:?}",
                    session_id, generation, kind
                );
                return;
            }
        }

        match kind {
            EventKind::Opened => {
                self.apply(&session_id, PhaseSignal::Opened);
            }
            EventKind::Message(raw) => self.on_message(&session_id, &raw),
            EventKind::Error(reason) => {
                warn!("Transport error: id={}, error={}", session_id, reason);
                self.apply(&session_id, PhaseSignal::Failed);
            }
            EventKind::Closed => {
                self.apply(&session_id, PhaseSignal::Closed);
            }
            EventKind::HandshakeDue => self.send_handshake(&session_id),
        }
    }

    fn on_message(&mut self, id: &SessionId, raw: &str) {
        let frame = decode(raw);
        if frame.is_readiness() {
            self.on_ready(id);
            return;
        }

        let text = match &frame {
            InboundFrame::Terminal { data } => data.as_str(),
            InboundFrame::Plain(text) => text.as_str(),
            InboundFrame::WsReady | InboundFrame::ShellReady => return,
        };

        let Some(state) = self.registry.get_mut(id) else {
            return;
        };
        let output = self.pipeline.process(text, Some(state.participant()));
        if output.agent_prompt && !state.agent_prompt_seen {
            debug!("Agent prompt seen: id={}", id);
            state.agent_prompt_seen = true;
        }
        if let Some(line) = output.role_lines.last() {
            state.last_reply = Some(line.text.clone());
        }
        if output.is_empty() {
            return;
        }
        self.sink.deliver(id, state.display_name(), &output);
    }

    fn on_ready(&mut self, id: &SessionId) {
        self.apply(id, PhaseSignal::HandshakeReady);

        let Some(state) = self.registry.get_mut(id) else {
            return;
        };
        if state.phase() != SessionPhase::Ready || state.handshake_completed {
            return;
        }
        state.handshake_completed = true;
        let generation = state.generation();

        let delay = self.handshake.delay();
        if delay.is_zero() {
            self.send_handshake(id);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime for a delayed handshake, sending now: id={}", id);
            self.send_handshake(id);
            return;
        };

        debug!("Handshake scheduled: id={}, delay={:?}", id, delay);
        let due = SessionEvent::new(id.clone(), generation, EventKind::HandshakeDue);
        let events = self.events.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(due);
        });
    }

    fn send_handshake(&mut self, id: &SessionId) {
        let Some(state) = self.registry.get(id) else {
            return;
        };
        if state.phase() != SessionPhase::Ready {
            return;
        }

        let frame = match &self.handshake {
            HandshakeStrategy::Priming { message } => OutboundFrame::command(
                structured_data(state.settings_path(), message),
                state.cli(),
                state.resolved_permission(),
            ),
            HandshakeStrategy::Keystroke { line, .. } => OutboundFrame::line(line),
        };
        info!("Sending handshake: id={}, cli={}", id, state.cli());
        self.send_frame(id, &frame);
    }

    /// Send one frame on a session's transport.
    ///
    /// A failed send moves the session to `Errored`.
    pub(crate) fn send_frame(&mut self, id: &SessionId, frame: &OutboundFrame) -> bool {
        let Some(state) = self.registry.get(id) else {
            return false;
        };
        let Some(transport) = state.transport.as_ref() else {
            return false;
        };

        match transport.send_text(frame.encode()) {
            Ok(()) => true,
            Err(e) => {
                warn!("Send failed: id={}, error={}", id, e);
                self.apply(id, PhaseSignal::Failed);
                false
            }
        }
    }

    /// Apply a signal, release the transport of an ended session and report
    /// the new phase.
    fn apply(&mut self, id: &SessionId, signal: PhaseSignal) -> Option<SessionPhase> {
        let Transition { to, ended, .. } = self.registry.transition(id, signal)?;

        match ended {
            Some(state) => {
                if let Some(transport) = state.transport.as_ref() {
                    transport.close();
                }
                self.report(id, state.display_name(), to);
            }
            None => {
                if let Some(state) = self.registry.get(id) {
                    self.report(id, state.display_name(), to);
                }
            }
        }
        Some(to)
    }

    fn report(&self, id: &SessionId, display_name: &str, phase: SessionPhase) {
        self.sink.phase_changed(id, display_name, phase);
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        for id in self.registry.ids() {
            if let Some(transport) = self
                .registry
                .get(&id)
                .and_then(|state| state.transport.as_ref())
            {
                transport.close();
            }
        }
    }
}
