//! Lifecycle and dispatch scenarios against in-memory transports.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use team_pty_core::{CliBackend, Error, MemberRole, Permission, SessionId, SessionPhase};
use team_pty_session::testing::{MemoryConnector, RecordingSink};
use team_pty_session::{
    event_channel, ConnectTarget, DispatchReport, EventKind, EventReceiver, HandshakeStrategy,
    LifecycleController,
};

struct Harness {
    controller: LifecycleController,
    connector: MemoryConnector,
    sink: RecordingSink,
    events: EventReceiver,
}

fn harness() -> Harness {
    let connector = MemoryConnector::new();
    let sink = RecordingSink::new();
    let (tx, events) = event_channel();
    let controller =
        LifecycleController::new(Arc::new(connector.clone()), tx, Arc::new(sink.clone()));
    Harness {
        controller,
        connector,
        sink,
        events,
    }
}

fn target(id: &str, name: &str) -> ConnectTarget {
    ConnectTarget {
        session_id: SessionId::from(id),
        display_name: name.to_string(),
        role: MemberRole::Developer,
        settings_path: "/srv/teams/core".to_string(),
    }
}

impl Harness {
    fn emit(&mut self, id: &SessionId, kind: EventKind) {
        let event = self.connector.event(id, kind);
        self.controller.handle_event(event);
    }

    fn message(&mut self, id: &SessionId, raw: &str) {
        self.emit(id, EventKind::Message(raw.to_string()));
    }

    fn connect_ready(&mut self, id: &str, name: &str) -> SessionId {
        let t = target(id, name);
        assert!(self.controller.connect(&t));
        self.emit(&t.session_id, EventKind::Opened);
        self.message(&t.session_id, r#"{"type":"ws_ready"}"#);
        assert_eq!(self.controller.phase(&t.session_id), SessionPhase::Ready);
        t.session_id
    }
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_ready_sends_one_priming_frame_then_classifies_output() {
    let mut h = harness();
    let t = target("m-1", "Ann");
    let id = t.session_id.clone();

    assert!(h.controller.connect(&t));
    assert_eq!(h.controller.phase(&id), SessionPhase::Connecting);
    h.emit(&id, EventKind::Opened);
    assert_eq!(h.controller.phase(&id), SessionPhase::AwaitingHandshake);

    h.message(&id, r#"{"type":"ws_ready"}"#);
    assert_eq!(h.controller.phase(&id), SessionPhase::Ready);

    let sent = h.connector.sent(&id);
    assert_eq!(sent.len(), 1);
    let frame = parse(&sent[0]);
    assert_eq!(frame["type"], "input");
    assert_eq!(frame["cli"], "claude");
    assert_eq!(frame["permission"], "bypass-permissions");
    let data = frame["data"].as_str().unwrap();
    assert!(data.starts_with("(Team Settings file path: /srv/teams/core. "));
    assert!(data.ends_with(") Let's pick today's meeting back up!"));

    h.message(&id, r#"{"type":"terminal","data":"\u001b[31mHello\u001b[0m\n"}"#);
    assert_eq!(h.sink.text(&id), "Hello\n");

    assert_eq!(
        h.sink.phases(&id),
        vec![
            SessionPhase::Connecting,
            SessionPhase::AwaitingHandshake,
            SessionPhase::Ready
        ]
    );
}

#[test]
fn test_handshake_sent_at_most_once() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");

    h.message(&id, r#"{"type":"shell_ready"}"#);
    h.message(&id, r#"{"type":"ws_ready"}"#);
    h.message(&id, r#"{"type":"shell_ready"}"#);
    h.emit(&id, EventKind::Opened);

    assert_eq!(h.connector.sent(&id).len(), 1);
    assert!(h.controller.snapshot(&id).unwrap().handshake_completed);
}

#[test]
fn test_readiness_while_connecting_goes_straight_to_ready() {
    let mut h = harness();
    let t = target("m-1", "Ann");
    let id = t.session_id.clone();
    h.controller.connect(&t);

    h.message(&id, r#"{"type":"shell_ready"}"#);
    assert_eq!(h.controller.phase(&id), SessionPhase::Ready);

    // A late open signal does not move the session back
    h.emit(&id, EventKind::Opened);
    assert_eq!(h.controller.phase(&id), SessionPhase::Ready);
    assert_eq!(h.connector.sent(&id).len(), 1);
}

#[test]
fn test_connect_is_idempotent_while_live() {
    let mut h = harness();
    let t = target("m-1", "Ann");
    assert!(h.controller.connect(&t));
    assert!(!h.controller.connect(&t));
    h.emit(&t.session_id, EventKind::Opened);
    assert!(!h.controller.connect(&t));

    assert_eq!(h.connector.opened(&t.session_id), 1);
    assert_eq!(h.controller.registry().len(), 1);
}

#[test]
fn test_send_to_unready_session_is_a_noop() {
    let mut h = harness();
    let t = target("m-1", "Ann");
    h.controller.connect(&t);

    let report = h.controller.dispatcher().send_to(&t.session_id, "status?");
    assert!(report.sent.is_empty());
    assert_eq!(report.skipped, vec![t.session_id.clone()]);
    assert!(h.connector.sent(&t.session_id).is_empty());

    // Unknown session as well
    let report = h
        .controller
        .dispatcher()
        .send_to(&SessionId::from("m-404"), "status?");
    assert_eq!(report.sent_count(), 0);
}

#[test]
fn test_broadcast_renders_per_recipient_payloads() {
    let mut h = harness();
    h.controller.set_cli(&SessionId::from("m-2"), CliBackend::Codex);
    h.controller.set_cli(&SessionId::from("m-3"), CliBackend::Gemini);
    h.controller
        .set_permission(&SessionId::from("m-1"), Permission::Plan)
        .unwrap();

    let a = h.connect_ready("m-1", "Ann");
    let b = h.connect_ready("m-2", "Bo");
    let c = h.connect_ready("m-3", "Cy");
    let team = vec![a.clone(), b.clone(), c.clone()];

    let report = h.controller.dispatcher().broadcast(&team, "line one\nline two");
    assert_eq!(report.sent, team);

    let last = |id: &SessionId| parse(h.connector.sent(id).last().unwrap());
    let (fa, fb, fc) = (last(&a), last(&b), last(&c));
    assert_eq!((fa["cli"].as_str(), fa["permission"].as_str()), (Some("claude"), Some("plan")));
    assert_eq!((fb["cli"].as_str(), fb["permission"].as_str()), (Some("codex"), Some("full-auto")));
    assert_eq!((fc["cli"].as_str(), fc["permission"].as_str()), (Some("gemini"), Some("yolo")));
    assert!(fa["data"].as_str().unwrap().ends_with(") line one line two"));
}

#[test]
fn test_broadcast_skips_unready_members() {
    let mut h = harness();
    let a = h.connect_ready("m-1", "Ann");
    let b = h.connect_ready("m-2", "Bo");
    h.controller.connect(&target("m-3", "Cy"));
    let team = vec![
        a.clone(),
        SessionId::from("m-3"),
        b.clone(),
        SessionId::from("m-4"),
    ];
    let before = h.connector.sent_total();

    let report = h.controller.dispatcher().broadcast(&team, "standup");
    assert_eq!(report.sent, vec![a, b]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(h.connector.sent_total() - before, 2);
}

#[test]
fn test_blank_text_is_not_sent() {
    let mut h = harness();
    let a = h.connect_ready("m-1", "Ann");
    let report = h.controller.dispatcher().send_to(&a, " \r\n ");
    assert_eq!(report, DispatchReport::default());
    assert_eq!(h.connector.sent(&a).len(), 1);
}

#[test]
fn test_transport_error_moves_to_errored_and_releases_state() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");

    h.emit(&id, EventKind::Error("connection reset".to_string()));
    assert_eq!(h.controller.phase(&id), SessionPhase::Idle);
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.connector.closed(&id), 1);
    assert_eq!(h.sink.phases(&id).last(), Some(&SessionPhase::Errored));
}

#[test]
fn test_reconnect_creates_fresh_state_and_ignores_stale_events() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    let old_generation = h.connector.generation(&id).unwrap();

    assert!(h.controller.disconnect(&id));
    assert_eq!(h.controller.phase(&id), SessionPhase::Idle);

    assert!(h.controller.connect(&target("m-1", "Ann")));
    assert_eq!(h.connector.opened(&id), 2);
    let snapshot = h.controller.snapshot(&id).unwrap();
    assert!(!snapshot.handshake_completed);

    // The old transport reporting its close must not touch the new state
    h.controller.handle_event(team_pty_session::SessionEvent::new(
        id.clone(),
        old_generation,
        EventKind::Closed,
    ));
    assert_eq!(h.controller.phase(&id), SessionPhase::Connecting);
}

#[test]
fn test_remote_close() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    h.emit(&id, EventKind::Closed);
    assert_eq!(h.controller.phase(&id), SessionPhase::Idle);
    assert_eq!(h.sink.phases(&id).last(), Some(&SessionPhase::Closed));
}

#[test]
fn test_failed_send_moves_to_errored() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    h.connector.fail_sends(&id);

    let report = h.controller.dispatcher().send_to(&id, "hello");
    assert_eq!(report.skipped, vec![id.clone()]);
    assert_eq!(h.controller.phase(&id), SessionPhase::Idle);
    assert_eq!(h.sink.phases(&id).last(), Some(&SessionPhase::Errored));
}

#[test]
fn test_refused_connect_errors_without_retry() {
    let mut h = harness();
    h.connector.refuse_open(true);
    let t = target("m-1", "Ann");

    assert!(!h.controller.connect(&t));
    assert_eq!(h.controller.phase(&t.session_id), SessionPhase::Idle);
    assert_eq!(h.sink.phases(&t.session_id), vec![SessionPhase::Errored]);
    assert_eq!(h.connector.opened_total(), 0);
}

#[test]
fn test_disconnect_all() {
    let mut h = harness();
    let a = h.connect_ready("m-1", "Ann");
    h.controller.connect(&target("m-2", "Bo"));

    assert_eq!(h.controller.disconnect_all(), 2);
    assert!(h.controller.registry().is_empty());
    assert_eq!(h.connector.closed(&a), 1);
    assert!(!h.controller.disconnect(&a));
}

#[test]
fn test_remove_forgets_selection() {
    let mut h = harness();
    let id = SessionId::from("m-1");
    h.controller.set_cli(&id, CliBackend::Codex);
    h.connect_ready("m-1", "Ann");

    h.controller.remove(&id);
    assert_eq!(h.controller.phase(&id), SessionPhase::Idle);
    assert_eq!(h.controller.registry().cli_for(&id), CliBackend::Claude);
}

#[test]
fn test_invalid_permission_rejected() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    let err = h
        .controller
        .set_permission(&id, Permission::Yolo)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(h.controller.snapshot(&id).unwrap().permission, Permission::Default);
}

#[test]
fn test_keys_and_lines_carry_no_tags() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");

    assert!(h.controller.dispatcher().send_keys(&id, "\u{3}"));
    assert!(h.controller.dispatcher().send_line(&id, "ls"));
    let sent = h.connector.sent(&id);
    let keys = parse(&sent[1]);
    let line = parse(&sent[2]);
    assert_eq!(keys["data"], "\u{3}");
    assert!(keys.get("cli").is_none());
    assert_eq!(line["data"], "ls\r\n");
    assert!(line.get("permission").is_none());
}

#[test]
fn test_resize_requires_open_transport() {
    let mut h = harness();
    let t = target("m-1", "Ann");
    h.controller.connect(&t);
    let id = t.session_id.clone();

    assert!(!h.controller.dispatcher().resize(&id, 120, 40));
    h.emit(&id, EventKind::Opened);
    assert!(!h.controller.dispatcher().resize(&id, 0, 40));
    assert!(h.controller.dispatcher().resize(&id, 120, 40));

    let frame = parse(&h.connector.sent(&id)[0]);
    assert_eq!(frame["type"], "resize");
    assert_eq!(frame["cols"], 120);
}

#[test]
fn test_plain_text_and_agent_prompt() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");

    h.message(&id, "bash-5.2$ ls\n");
    h.message(&id, "\u{1b}[2m? for shortcuts\u{1b}[0m");
    assert_eq!(h.sink.text(&id), "bash-5.2$ ls\n? for shortcuts");
    assert!(h.controller.snapshot(&id).unwrap().agent_prompt_seen);
}

#[test]
fn test_filtered_output_is_not_delivered() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    h.message(&id, r#"{"type":"terminal","data":"\u001b[2m42% context left\u001b[0m\r\n"}"#);
    assert_eq!(h.sink.text(&id), "");
}

#[test]
fn test_latest_spoken_line_is_recorded() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");
    assert_eq!(h.controller.snapshot(&id).unwrap().last_reply, None);

    h.message(&id, r#"{"type":"terminal","data":"Ann: schema drafted\r\nAnn: tests are green\r\n"}"#);
    h.message(&id, "unrelated build output\n");

    let snapshot = h.controller.snapshot(&id).unwrap();
    assert_eq!(snapshot.last_reply.as_deref(), Some("tests are green"));
    assert!(h.sink.text(&id).contains("Ann: schema drafted\n"));
}

#[test]
fn test_settings_path_update_applies_to_next_send() {
    let mut h = harness();
    let id = h.connect_ready("m-1", "Ann");

    assert!(h.controller.set_settings_path(&id, "/srv/teams/renamed"));
    let report = h.controller.dispatcher().send_to(&id, "status?");
    assert_eq!(report.sent_count(), 1);

    let sent = h.connector.sent(&id);
    let data = parse(sent.last().unwrap())["data"].as_str().unwrap().to_string();
    assert!(data.contains("/srv/teams/renamed."));
    assert!(!data.contains("/srv/teams/core"));
    assert!(!h.controller.set_settings_path(&SessionId::from("m-9"), "/x"));
}

#[test]
fn test_keystroke_handshake_without_delay() {
    let mut h = harness();
    h.controller = LifecycleController::new(
        Arc::new(h.connector.clone()),
        event_channel().0,
        Arc::new(h.sink.clone()),
    )
    .with_handshake(HandshakeStrategy::keystroke("claude", Duration::ZERO));

    let id = h.connect_ready("m-1", "Ann");
    let sent = h.connector.sent(&id);
    assert_eq!(sent.len(), 1);
    let frame = parse(&sent[0]);
    assert_eq!(frame["data"], "claude\r\n");
    assert!(frame.get("cli").is_none());
}

#[tokio::test]
async fn test_keystroke_handshake_after_delay() {
    let mut h = harness();
    h.controller = {
        let (tx, rx) = event_channel();
        h.events = rx;
        LifecycleController::new(Arc::new(h.connector.clone()), tx, Arc::new(h.sink.clone()))
            .with_handshake(HandshakeStrategy::keystroke("codex", Duration::from_millis(20)))
    };

    let id = h.connect_ready("m-1", "Ann");
    assert!(h.connector.sent(&id).is_empty());

    let due = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(due.kind, EventKind::HandshakeDue);
    h.controller.handle_event(due);

    let sent = h.connector.sent(&id);
    assert_eq!(sent.len(), 1);
    assert_eq!(parse(&sent[0])["data"], "codex\r\n");

    // A second readiness frame schedules nothing
    h.message(&id, r#"{"type":"ws_ready"}"#);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_delayed_handshake_dropped_after_disconnect() {
    let mut h = harness();
    h.controller = {
        let (tx, rx) = event_channel();
        h.events = rx;
        LifecycleController::new(Arc::new(h.connector.clone()), tx, Arc::new(h.sink.clone()))
            .with_handshake(HandshakeStrategy::keystroke("claude", Duration::from_millis(10)))
    };

    let id = h.connect_ready("m-1", "Ann");
    h.controller.disconnect(&id);

    let due = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
        .await
        .unwrap()
        .unwrap();
    h.controller.handle_event(due);
    assert!(h.connector.sent(&id).is_empty());
}
