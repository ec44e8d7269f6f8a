//! Property-based tests for the session runtime.

use std::sync::Arc;

use proptest::prelude::*;

use team_pty_core::{MemberRole, SessionId, SessionPhase};
use team_pty_session::testing::{MemoryConnector, RecordingSink};
use team_pty_session::{event_channel, ConnectTarget, EventKind, LifecycleController};

fn controller(connector: &MemoryConnector) -> LifecycleController {
    LifecycleController::new(
        Arc::new(connector.clone()),
        event_channel().0,
        Arc::new(RecordingSink::new()),
    )
}

fn target(id: &str) -> ConnectTarget {
    ConnectTarget {
        session_id: SessionId::from(id),
        display_name: format!("agent {id}"),
        role: MemberRole::Member,
        settings_path: "/srv/teams/core".to_string(),
    }
}

#[derive(Debug, Clone)]
enum Step {
    Connect,
    Opened,
    Ready,
    Output,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Connect),
        1 => Just(Step::Opened),
        1 => Just(Step::Ready),
        1 => Just(Step::Output),
    ]
}

proptest! {
    /// Repeated connects interleaved with non-terminal events open exactly
    /// one transport per id.
    #[test]
    fn one_transport_per_session(steps in proptest::collection::vec(step(), 1..40)) {
        let connector = MemoryConnector::new();
        let mut controller = controller(&connector);
        let t = target("m-1");
        let id = t.session_id.clone();

        controller.connect(&t);
        for step in steps {
            match step {
                Step::Connect => {
                    controller.connect(&t);
                }
                Step::Opened => controller.handle_event(connector.event(&id, EventKind::Opened)),
                Step::Ready => controller.handle_event(
                    connector.event(&id, EventKind::Message(r#"{"type":"ws_ready"}"#.to_string())),
                ),
                Step::Output => controller.handle_event(
                    connector.event(&id, EventKind::Message("build ok\n".to_string())),
                ),
            }
            prop_assert!(controller.phase(&id).is_live());
        }

        prop_assert_eq!(connector.opened(&id), 1);
        prop_assert_eq!(controller.registry().len(), 1);
    }

    /// The initialization command goes out at most once however many
    /// readiness frames arrive.
    #[test]
    fn handshake_sent_at_most_once(
        frames in proptest::collection::vec(prop_oneof![Just("ws_ready"), Just("shell_ready")], 1..12)
    ) {
        let connector = MemoryConnector::new();
        let mut controller = controller(&connector);
        let t = target("m-1");
        controller.connect(&t);

        for frame in frames {
            let raw = format!(r#"{{"type":"{frame}"}}"#);
            controller.handle_event(connector.event(&t.session_id, EventKind::Message(raw)));
        }

        prop_assert_eq!(controller.phase(&t.session_id), SessionPhase::Ready);
        prop_assert_eq!(connector.sent(&t.session_id).len(), 1);
    }

    /// Broadcast to M ready and K unready members sends exactly M frames.
    #[test]
    fn broadcast_reaches_only_ready_sessions(ready in 0usize..6, unready in 0usize..6) {
        let connector = MemoryConnector::new();
        let mut controller = controller(&connector);
        let mut team = Vec::new();

        for i in 0..ready {
            let t = target(&format!("m-{i}"));
            controller.connect(&t);
            controller.handle_event(connector.event(&t.session_id, EventKind::Opened));
            controller.handle_event(
                connector.event(&t.session_id, EventKind::Message(r#"{"type":"shell_ready"}"#.to_string())),
            );
            team.push(t.session_id);
        }
        for i in 0..unready {
            let t = target(&format!("u-{i}"));
            if i % 2 == 0 {
                controller.connect(&t);
            }
            team.push(t.session_id);
        }

        let before = connector.sent_total();
        let report = controller.dispatcher().broadcast(&team, "status report please");
        prop_assert_eq!(report.sent.len(), ready);
        prop_assert_eq!(report.skipped.len(), unready);
        prop_assert_eq!(connector.sent_total() - before, ready);
    }
}
