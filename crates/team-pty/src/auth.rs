//! Signed-in user loading.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct StoredUser {
    #[serde(default)]
    id: Option<i64>,
}

/// Read the signed-in user id from a `{"id": ...}` JSON file.
///
/// A missing or unreadable file, malformed JSON, or a missing or zero id all
/// mean nobody is signed in.
pub fn load_user_id(path: Option<&Path>) -> Option<i64> {
    let path = path?;
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("No signed-in user file: path={}, error={}", path.display(), e);
            return None;
        }
    };

    parse_user_id(&text).or_else(|| {
        warn!("Signed-in user file has no usable id: path={}", path.display());
        None
    })
}

fn parse_user_id(text: &str) -> Option<i64> {
    let user: StoredUser = serde_json::from_str(text).ok()?;
    user.id.filter(|id| *id != 0)
}
