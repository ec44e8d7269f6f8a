//! Dispatcher: targeted and broadcast sends.
//!
//! Sends reach only sessions in `Ready`; every other recipient is skipped
//! without queueing or failing. Structured commands are rendered per
//! recipient from that recipient's own backend, resolved permission and
//! settings path.

use tracing::debug;

use team_pty_core::{SessionId, SessionPhase};
use team_pty_protocol::OutboundFrame;

use crate::command::{normalize_operator_text, structured_data};
use crate::lifecycle::LifecycleController;
use crate::session::SessionState;

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sessions a frame was sent to
    pub sent: Vec<SessionId>,
    /// Sessions skipped because they were not ready or their send failed
    pub skipped: Vec<SessionId>,
}

impl DispatchReport {
    /// Number of frames sent.
    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    fn record(&mut self, id: &SessionId, sent: bool) {
        if sent {
            self.sent.push(id.clone());
        } else {
            self.skipped.push(id.clone());
        }
    }
}

/// Resolves user actions into frames on the right transports.
pub struct Dispatcher<'a> {
    controller: &'a mut LifecycleController,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(controller: &'a mut LifecycleController) -> Self {
        Self { controller }
    }

    /// Send operator text to one session as a structured command.
    ///
    /// Whitespace-only text sends nothing.
    pub fn send_to(&mut self, id: &SessionId, text: &str) -> DispatchReport {
        self.broadcast(std::slice::from_ref(id), text)
    }

    /// Send operator text to every ready session among `team_sessions`.
    ///
    /// Each recipient gets its own payload. Recipients are addressed in
    /// order without waiting on one another.
    pub fn broadcast(&mut self, team_sessions: &[SessionId], text: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(text) = normalize_operator_text(text) else {
            debug!("Blank operator text, nothing sent");
            return report;
        };

        for id in team_sessions {
            let frame = self.ready_session(id).map(|state| {
                OutboundFrame::command(
                    structured_data(state.settings_path(), &text),
                    state.cli(),
                    state.resolved_permission(),
                )
            });
            let sent = match frame {
                Some(frame) => self.controller.send_frame(id, &frame),
                None => false,
            };
            report.record(id, sent);
        }

        debug!(
            "Dispatched operator text: sent={}, skipped={}",
            report.sent.len(),
            report.skipped.len()
        );
        report
    }

    /// Pass raw keystrokes through to one session, untagged.
    pub fn send_keys(&mut self, id: &SessionId, data: &str) -> bool {
        if data.is_empty() || self.ready_session(id).is_none() {
            return false;
        }
        self.controller
            .send_frame(id, &OutboundFrame::keystrokes(data))
    }

    /// Type a whole line (text plus `\r\n`) into one session.
    pub fn send_line(&mut self, id: &SessionId, line: &str) -> bool {
        if self.ready_session(id).is_none() {
            return false;
        }
        self.controller.send_frame(id, &OutboundFrame::line(line))
    }

    /// Resize a session's remote viewport.
    ///
    /// Sent once the transport is open; degenerate sizes are dropped.
    pub fn resize(&mut self, id: &SessionId, cols: u16, rows: u16) -> bool {
        let Some(frame) = OutboundFrame::resize(cols, rows) else {
            debug!("Ignoring degenerate resize: id={}, {}x{}", id, cols, rows);
            return false;
        };
        match self.controller.phase(id) {
            SessionPhase::AwaitingHandshake | SessionPhase::Ready => {
                self.controller.send_frame(id, &frame)
            }
            phase => {
                debug!("Skipping resize: id={}, phase={}", id, phase);
                false
            }
        }
    }

    fn ready_session(&self, id: &SessionId) -> Option<&SessionState> {
        match self.controller.registry().get(id) {
            Some(state) if state.phase() == SessionPhase::Ready => Some(state),
            Some(state) => {
                debug!("Skipping send: id={}, phase={}", id, state.phase());
                None
            }
            None => {
                debug!("Skipping send: id={}, no session", id);
                None
            }
        }
    }
}
