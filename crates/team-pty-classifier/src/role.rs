//! Role-line extraction and agent prompt detection.

use regex::Regex;

use crate::filters::{clean_line, is_gibberish, is_noise, is_setup_echo, is_trivial_text};

/// A line spoken by a named participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLine {
    /// Participant name as configured
    pub role: String,
    /// Text after `<name>:`
    pub text: String,
}

/// Finds `<name>:` lines for one participant.
#[derive(Debug, Clone)]
pub struct RoleLineParser {
    name: String,
    pattern: Option<Regex>,
}

impl RoleLineParser {
    /// Create a parser for the given participant name.
    ///
    /// An empty name never matches.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let pattern = if name.is_empty() {
            None
        } else {
            Regex::new(&format!("(?i){}:", regex::escape(name))).ok()
        };
        Self {
            name: name.to_string(),
            pattern,
        }
    }

    /// Participant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extract the participant's spoken text from a line.
    ///
    /// The trailing text must survive the noise, gibberish, trivial and
    /// setup-echo filters; otherwise there is no match.
    pub fn parse(&self, line: &str) -> Option<RoleLine> {
        let pattern = self.pattern.as_ref()?;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_noise(trimmed) || is_gibberish(trimmed) {
            return None;
        }

        let found = pattern.find(trimmed)?;
        let text = clean_line(&trimmed[found.end()..]);
        if text.is_empty()
            || is_noise(&text)
            || is_setup_echo(&text)
            || is_trivial_text(&text)
            || is_gibberish(&text)
        {
            return None;
        }

        Some(RoleLine {
            role: self.name.clone(),
            text,
        })
    }
}

/// Extract `name`'s spoken text from a line. See [`RoleLineParser::parse`].
pub fn parse_role_line(name: &str, line: &str) -> Option<RoleLine> {
    RoleLineParser::new(name).parse(line)
}

const PROMPT_MARKERS: &[&str] = &["Welcome", "Claude Code v", "Try \"", "? for shortcuts"];
const PROMPT_FAILURES: &[&str] = &["requires git-bash", "not recognized"];

/// Whether a (stripped) chunk shows an agent CLI's startup prompt.
pub fn looks_like_agent_prompt(chunk: &str) -> bool {
    if chunk.is_empty() || PROMPT_FAILURES.iter().any(|m| chunk.contains(m)) {
        return false;
    }
    PROMPT_MARKERS.iter().any(|m| chunk.contains(m))
}
