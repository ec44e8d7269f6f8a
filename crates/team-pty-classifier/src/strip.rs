//! Terminal control-sequence stripping.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// CSI sequences: cursor movement, colors, erase, modes.
    static ref CSI: Regex = Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").unwrap();
    /// OSC sequences terminated by BEL.
    static ref OSC_BEL: Regex = Regex::new(r"\x1b\][^\x07]*\x07").unwrap();
    /// OSC sequences terminated by ESC backslash.
    static ref OSC_ST: Regex = Regex::new(r"\x1b\][^\x1b]*\x1b\\").unwrap();
    /// Shift-out / shift-in.
    static ref SHIFT: Regex = Regex::new(r"[\x0e\x0f]").unwrap();
}

/// Remove escape sequences and shift characters from terminal text.
///
/// Idempotent: removing one sequence can splice its neighbours into a new
/// sequence (`ESC ESC[0m [31m`), so passes repeat until nothing changes.
pub fn strip_control_sequences(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let out = CSI.replace_all(text, "");
    let out = OSC_BEL.replace_all(&out, "");
    let out = OSC_ST.replace_all(&out, "");
    SHIFT.replace_all(&out, "").into_owned()
}
