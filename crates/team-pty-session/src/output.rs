//! Output sinks and the session transcript.

use std::sync::{Arc, Mutex, MutexGuard};

use team_pty_classifier::ClassifiedOutput;
use team_pty_core::{SessionId, SessionPhase};

/// Prefix of operator-typed lines echoed into the transcript.
pub const LOCAL_ECHO_PREFIX: &str = "[me] ";

/// Receives classified output and phase reports from the lifecycle controller.
pub trait OutputSink: Send + Sync {
    /// A chunk survived classification.
    fn deliver(&self, session_id: &SessionId, display_name: &str, output: &ClassifiedOutput);

    /// A session changed phase.
    fn phase_changed(&self, session_id: &SessionId, display_name: &str, phase: SessionPhase);
}

/// Transcript of everything shown to the operator.
#[derive(Debug, Default)]
pub struct OutputLog {
    /// Transcript text
    text: String,
    /// Position of last read
    last_read_pos: usize,
}

impl OutputLog {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session's chunk as `[<name>]\n<text>`, newline-terminated.
    pub fn append_output(&mut self, display_name: &str, text: &str) {
        self.text.push('[');
        self.text.push_str(display_name);
        self.text.push_str("]\n");
        self.text.push_str(text);
        if !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// Echo operator text, one `[me] ` line per input line.
    pub fn append_local(&mut self, text: &str) {
        for line in text.lines() {
            self.text.push_str(LOCAL_ECHO_PREFIX);
            self.text.push_str(line);
            self.text.push('\n');
        }
    }

    /// Append a status notice line.
    pub fn append_notice(&mut self, notice: &str) {
        self.text.push_str("* ");
        self.text.push_str(notice);
        self.text.push('\n');
    }

    /// Get the transcript written since the last read.
    pub fn read_since_last(&mut self) -> String {
        let output = self.text[self.last_read_pos..].to_string();
        self.last_read_pos = self.text.len();
        output
    }
}

/// An [`OutputLog`] shared between the controller and its reader.
#[derive(Debug, Clone, Default)]
pub struct SharedOutputLog(Arc<Mutex<OutputLog>>);

impl SharedOutputLog {
    /// Create an empty shared transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the transcript.
    pub fn lock(&self) -> MutexGuard<'_, OutputLog> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for SharedOutputLog {
    fn deliver(&self, _session_id: &SessionId, display_name: &str, output: &ClassifiedOutput) {
        self.lock().append_output(display_name, &output.text);
    }

    fn phase_changed(&self, session_id: &SessionId, display_name: &str, phase: SessionPhase) {
        self.lock()
            .append_notice(&format!("{display_name} ({session_id}) is {phase}"));
    }
}
