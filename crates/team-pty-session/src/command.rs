//! Structured command payloads.
//!
//! Every structured `input` frame opens with a short preamble naming the
//! team settings path, followed by the operator's text:
//!
//! ```text
//! (Team Settings file path: /srv/teams/core. Read every md file ...) <text>
//! ```

use team_pty_classifier::TEAM_SETTINGS_MARKER;

/// Instruction carried inside the settings preamble.
pub const SETTINGS_INSTRUCTION: &str = "Read every md file under this path so you can answer; \
inside the members folder read only the md file matching your own name. \
Acknowledge the contents of these parentheses but do not reflect them in your reply.";

/// Preamble naming the team settings path.
///
/// An empty path becomes `.`; a `.` is appended unless the path already
/// ends with one.
pub fn settings_prefix(settings_path: &str) -> String {
    let path = settings_path.trim();
    let path = if path.is_empty() { "." } else { path };
    let terminator = if path.ends_with('.') { "" } else { "." };
    format!("{TEAM_SETTINGS_MARKER} {path}{terminator} {SETTINGS_INSTRUCTION}) ")
}

/// `data` of a structured command: preamble plus text.
pub fn structured_data(settings_path: &str, text: &str) -> String {
    let mut data = settings_prefix(settings_path);
    data.push_str(text);
    data
}

/// Normalize operator text before dispatch.
///
/// Runs of line breaks collapse into a single space. Returns `None` for
/// whitespace-only text, which is never sent.
pub fn normalize_operator_text(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }

    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_prefix_appends_period() {
        let prefix = settings_prefix("/srv/teams/core");
        assert!(prefix.starts_with("(Team Settings file path: /srv/teams/core. Read every md file"));
        assert!(prefix.ends_with(") "));
    }

    #[test]
    fn test_settings_prefix_keeps_existing_period() {
        let prefix = settings_prefix("/srv/teams/core.");
        assert!(prefix.starts_with("(Team Settings file path: /srv/teams/core. "));
        assert!(!prefix.contains("core.."));
    }

    #[test]
    fn test_settings_prefix_empty_path() {
        assert!(settings_prefix("").starts_with("(Team Settings file path: . "));
        assert!(settings_prefix("   ").starts_with("(Team Settings file path: . "));
    }

    #[test]
    fn test_structured_data() {
        let data = structured_data("/t", "status?");
        assert!(data.starts_with(TEAM_SETTINGS_MARKER));
        assert!(data.ends_with(") status?"));
    }

    #[test]
    fn test_normalize_collapses_line_breaks() {
        assert_eq!(
            normalize_operator_text("first\r\n\r\nsecond\nthird").as_deref(),
            Some("first second third")
        );
    }

    #[test]
    fn test_normalize_rejects_blank() {
        assert_eq!(normalize_operator_text(""), None);
        assert_eq!(normalize_operator_text(" \n\r\n\t"), None);
    }

    #[test]
    fn test_normalize_keeps_inner_spacing() {
        assert_eq!(normalize_operator_text("a  b").as_deref(), Some("a  b"));
    }
}
