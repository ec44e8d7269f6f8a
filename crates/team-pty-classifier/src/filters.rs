//! Drop filters for non-informative terminal lines.

/// Opening of the priming prefix the runtime injects into structured commands.
pub const TEAM_SETTINGS_MARKER: &str = "(Team Settings file path:";

/// Operational markers agent CLIs print around real output.
const NOISE_MARKERS: &[&str] = &[
    // context-remaining indicators
    "context left",
    // progress and interrupt hints
    "working(",
    "esc to interrupt",
    "tip:",
    // banners
    "claude",
    "model:",
    "directory:",
    "microsoft windows",
    "all rights reserved",
    "heads up",
    // slash-command hints
    "use /skills",
    "run /review",
    "run /status",
];

/// Phrases that echo priming instructions back at us.
const SETUP_ECHO_PREFIXES: &[&str] = &["your name is \""];
const SETUP_ECHO_FRAGMENTS: &[&str] = &["when you reply, always prefix your response"];

/// Trailing status fragment some CLIs append to the prompt line.
const CONTEXT_SUFFIX: &str = "100% context left";

/// Normalize a line for classification: non-breaking spaces become spaces,
/// surrounding whitespace is trimmed and a trailing context indicator is cut.
pub fn clean_line(line: &str) -> String {
    let text = line.replace('\u{a0}', " ");
    let text = text.trim();
    match text.to_lowercase().find(CONTEXT_SUFFIX) {
        // Lowercasing can shift byte offsets for non-ASCII text; only cut
        // when the offset is still a boundary of the original.
        Some(idx) if text.is_char_boundary(idx) => text[..idx].trim().to_string(),
        _ => text.to_string(),
    }
}

/// Whether a line is operational noise.
///
/// Matches case-insensitively on a fixed set of markers, or a line made of a
/// single repeated letter (cursor-blink residue such as `mmmm`).
pub fn is_noise(line: &str) -> bool {
    let lower = line.to_lowercase();
    if NOISE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }
    is_repeated_letter(lower.trim())
}

fn is_repeated_letter(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c == first),
        _ => false,
    }
}

/// Whether text looks like rendering garbage rather than prose.
///
/// Text shorter than 20 characters is never gibberish.
pub fn is_gibberish(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if len < 20 {
        return false;
    }

    let mut distinct: Vec<char> = text.chars().collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() <= 3 {
        return true;
    }

    !text.contains(' ') && len > 60
}

/// Whether text carries nothing worth showing: empty, a single character,
/// only quotes, or only punctuation.
pub fn is_trivial_text(text: &str) -> bool {
    let text = text.trim();
    if text.chars().count() < 2 {
        return true;
    }
    if text.chars().all(|c| c == '\'' || c == '"') {
        return true;
    }
    text.chars().all(|c| !c.is_alphanumeric())
}

/// Whether text echoes the priming preamble the runtime itself sent.
pub fn is_setup_echo(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    SETUP_ECHO_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
        || SETUP_ECHO_FRAGMENTS
            .iter()
            .any(|fragment| lower.contains(fragment))
        || lower.contains(&TEAM_SETTINGS_MARKER.to_lowercase())
}
