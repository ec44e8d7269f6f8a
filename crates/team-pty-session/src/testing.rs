//! In-memory transports for exercising the lifecycle without a network.
//!
//! [`MemoryConnector`] records every transport it opens and every frame sent
//! on them, and lets a test play the remote host by posting events.

use std::sync::{Arc, Mutex, MutexGuard};

use team_pty_classifier::ClassifiedOutput;
use team_pty_core::{Error, Result, SessionId, SessionPhase};

use crate::output::OutputSink;
use crate::transport::{Connector, EventKind, EventSender, SessionEvent, Transport};

#[derive(Debug, Default)]
struct Wire {
    opened: Vec<(SessionId, u64)>,
    sent: Vec<(SessionId, String)>,
    closed: Vec<SessionId>,
    failing_sends: Vec<SessionId>,
    refuse_open: bool,
}

/// Connector whose transports live in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    wire: Arc<Mutex<Wire>>,
}

impl MemoryConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self::default()
    }

    fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every later open fail.
    pub fn refuse_open(&self, refuse: bool) {
        self.wire().refuse_open = refuse;
    }

    /// Make sends on a session's transport fail.
    pub fn fail_sends(&self, id: &SessionId) {
        self.wire().failing_sends.push(id.clone());
    }

    /// Number of transports opened for a session.
    pub fn opened(&self, id: &SessionId) -> usize {
        self.wire().opened.iter().filter(|(s, _)| s == id).count()
    }

    /// Total number of transports opened.
    pub fn opened_total(&self) -> usize {
        self.wire().opened.len()
    }

    /// Generation of the latest transport opened for a session.
    pub fn generation(&self, id: &SessionId) -> Option<u64> {
        self.wire()
            .opened
            .iter()
            .rev()
            .find(|(s, _)| s == id)
            .map(|(_, generation)| *generation)
    }

    /// Payloads sent to a session, in order.
    pub fn sent(&self, id: &SessionId) -> Vec<String> {
        self.wire()
            .sent
            .iter()
            .filter(|(s, _)| s == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Total number of payloads sent.
    pub fn sent_total(&self) -> usize {
        self.wire().sent.len()
    }

    /// Number of close calls for a session.
    pub fn closed(&self, id: &SessionId) -> usize {
        self.wire().closed.iter().filter(|s| *s == id).count()
    }

    /// Event for the latest transport of a session.
    pub fn event(&self, id: &SessionId, kind: EventKind) -> SessionEvent {
        SessionEvent::new(id.clone(), self.generation(id).unwrap_or_default(), kind)
    }
}

impl Connector for MemoryConnector {
    fn open(
        &self,
        session_id: &SessionId,
        generation: u64,
        _events: EventSender,
    ) -> Result<Box<dyn Transport>> {
        let mut wire = self.wire();
        if wire.refuse_open {
            return Err(Error::Transport("connection refused".to_string()));
        }
        wire.opened.push((session_id.clone(), generation));
        Ok(Box::new(MemoryTransport {
            session_id: session_id.clone(),
            wire: Arc::clone(&self.wire),
        }))
    }
}

struct MemoryTransport {
    session_id: SessionId,
    wire: Arc<Mutex<Wire>>,
}

impl Transport for MemoryTransport {
    fn send_text(&self, text: String) -> Result<()> {
        let mut wire = self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if wire.failing_sends.contains(&self.session_id) {
            return Err(Error::Transport("connection reset".to_string()));
        }
        wire.sent.push((self.session_id.clone(), text));
        Ok(())
    }

    fn close(&self) {
        let mut wire = self.wire.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        wire.closed.push(self.session_id.clone());
    }
}

/// What a [`RecordingSink`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkRecord {
    /// A delivered chunk
    Output {
        /// Session
        session_id: SessionId,
        /// Classified output
        output: ClassifiedOutput,
    },
    /// A phase report
    Phase {
        /// Session
        session_id: SessionId,
        /// New phase
        phase: SessionPhase,
    },
}

/// Sink that records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<SinkRecord>>>,
}

impl RecordingSink {
    /// Create a sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Delivered text for a session, concatenated.
    pub fn text(&self, id: &SessionId) -> String {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Output { session_id, output } if &session_id == id => {
                    Some(output.text)
                }
                _ => None,
            })
            .collect()
    }

    /// Phases reported for a session, in order.
    pub fn phases(&self, id: &SessionId) -> Vec<SessionPhase> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Phase { session_id, phase } if &session_id == id => Some(phase),
                _ => None,
            })
            .collect()
    }

    fn push(&self, record: SinkRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }
}

impl OutputSink for RecordingSink {
    fn deliver(&self, session_id: &SessionId, _display_name: &str, output: &ClassifiedOutput) {
        self.push(SinkRecord::Output {
            session_id: session_id.clone(),
            output: output.clone(),
        });
    }

    fn phase_changed(&self, session_id: &SessionId, _display_name: &str, phase: SessionPhase) {
        self.push(SinkRecord::Phase {
            session_id: session_id.clone(),
            phase,
        });
    }
}
