//! Transport seam between the lifecycle controller and the remote PTY host.
//!
//! A [`Connector`] opens one [`Transport`] per session. Everything the
//! transport observes (open, message, error, close) is posted to the
//! controller as a [`SessionEvent`] tagged with the session id and the
//! generation of the Session State that owns the transport, so events from a
//! replaced transport can be recognized and ignored.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use team_pty_core::{Error, Result, SessionId};

/// What happened on a session's transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The transport is open
    Opened,
    /// One inbound payload, in arrival order
    Message(String),
    /// The transport failed
    Error(String),
    /// The transport closed (remote close or after an explicit close)
    Closed,
    /// A delayed handshake send is due
    HandshakeDue,
}

/// A transport event addressed to one Session State.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Session the event belongs to
    pub session_id: SessionId,
    /// Generation of the Session State that opened the transport
    pub generation: u64,
    /// The event
    pub kind: EventKind,
}

impl SessionEvent {
    /// Create an event.
    pub fn new(session_id: SessionId, generation: u64, kind: EventKind) -> Self {
        Self {
            session_id,
            generation,
            kind,
        }
    }
}

/// Sending half of the controller's event queue.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half of the controller's event queue.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create the event queue the controller consumes.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// An open (or opening) duplex connection, exclusively owned by one session.
pub trait Transport: Send {
    /// Queue one text payload for sending.
    ///
    /// Fails when the transport is already gone.
    fn send_text(&self, text: String) -> Result<()>;

    /// Close the transport. Closing twice is harmless.
    fn close(&self);
}

/// Opens transports.
pub trait Connector: Send + Sync {
    /// Start opening a transport for a session.
    ///
    /// Returns immediately; the open signal arrives later as
    /// [`EventKind::Opened`] on `events`.
    fn open(
        &self,
        session_id: &SessionId,
        generation: u64,
        events: EventSender,
    ) -> Result<Box<dyn Transport>>;
}

enum Outgoing {
    Text(String),
    Close,
}

/// WebSocket connector: one socket per session to the PTY host endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for the given `ws://` or `wss://` endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Endpoint url.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        session_id: &SessionId,
        generation: u64,
        events: EventSender,
    ) -> Result<Box<dyn Transport>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Transport(format!("no async runtime: {e}")))?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let events = TaggedEvents {
            session_id: session_id.clone(),
            generation,
            events,
        };
        runtime.spawn(run_socket(self.url.clone(), outgoing_rx, events));

        Ok(Box::new(WsTransport {
            outgoing: outgoing_tx,
        }))
    }
}

/// Handle to a socket task.
struct WsTransport {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Transport for WsTransport {
    fn send_text(&self, text: String) -> Result<()> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| Error::Transport("send on closed transport".to_string()))
    }

    fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

struct TaggedEvents {
    session_id: SessionId,
    generation: u64,
    events: EventSender,
}

impl TaggedEvents {
    fn emit(&self, kind: EventKind) {
        let event = SessionEvent::new(self.session_id.clone(), self.generation, kind);
        if self.events.send(event).is_err() {
            debug!(
                "Event queue gone, dropping transport event: session={}",
                self.session_id
            );
        }
    }
}

async fn run_socket(
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: TaggedEvents,
) {
    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!(
                "Transport failed to open: session={}, url={}, error={}",
                events.session_id, url, e
            );
            events.emit(EventKind::Error(e.to_string()));
            return;
        }
    };

    info!("Transport open: session={}, url={}", events.session_id, url);
    events.emit(EventKind::Opened);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!("Transport send failed: session={}, error={}", events.session_id, e);
                        events.emit(EventKind::Error(e.to_string()));
                        return;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    debug!("Transport closed locally: session={}", events.session_id);
                    events.emit(EventKind::Closed);
                    return;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    events.emit(EventKind::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    events.emit(EventKind::Message(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Transport closed by remote: session={}", events.session_id);
                    events.emit(EventKind::Closed);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Transport receive failed: session={}, error={}", events.session_id, e);
                    events.emit(EventKind::Error(e.to_string()));
                    return;
                }
            },
        }
    }
}
