//! In-process stand-in for the collaborator API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Clone, Default)]
pub struct HttpStub {
    routes: Arc<Mutex<HashMap<String, (u16, String)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn respond(
    State(stub): State<HttpStub>,
    method: Method,
    uri: Uri,
    body: String,
) -> impl IntoResponse {
    let key = format!("{} {}", method, uri.path());
    let (status, reply) = stub
        .routes
        .lock()
        .expect("routes lock")
        .get(&key)
        .cloned()
        .unwrap_or((404, r#"{"error":"not found"}"#.to_string()));

    stub.requests.lock().expect("requests lock").push(Recorded {
        method: method.to_string(),
        target: uri.to_string(),
        body,
    });

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply)
}

impl HttpStub {
    /// Start the stub; returns it with its base url.
    pub async fn start() -> (Self, String) {
        let stub = Self::default();
        let app = Router::new()
            .route("/api/teams", get(respond).post(respond))
            .route("/api/projects", get(respond).post(respond))
            .route("/api/members", post(respond))
            .route("/api/members/{member_id}", delete(respond))
            .with_state(stub.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let address: SocketAddr = listener.local_addr().expect("stub listener local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("run stub server");
        });
        (stub, format!("http://{address}"))
    }

    /// Answer `METHOD /path` (query excluded) with a status and body.
    pub fn route(&self, method: &str, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(format!("{method} {path}"), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn last(&self, method: &str) -> Option<Recorded> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == method)
    }

    /// Replace the teams the stub serves.
    pub fn serve_teams(&self, body: &str) {
        self.route("GET", "/api/teams", 200, body);
    }
}

pub const TEAMS_JSON: &str = r#"[
  {
    "id": 7,
    "name": "core",
    "config": "read the md files first\n/srv/teams/core\n",
    "members": [
      { "id": 1, "name": "Ann", "role": "LEADER" },
      { "id": 2, "name": "Bo", "role": "DEVELOPER", "config": "rust" }
    ]
  },
  { "id": 9, "name": "web", "members": [] }
]"#;
