//! The composed output pipeline: strip, then drop filters, line by line.

use tracing::trace;

use team_pty_core::FilterMode;

use crate::filters::{clean_line, is_gibberish, is_noise, is_setup_echo, is_trivial_text};
use crate::role::{looks_like_agent_prompt, RoleLine, RoleLineParser};
use crate::strip::strip_control_sequences;

/// Result of running one inbound chunk through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedOutput {
    /// Text that survived classification, newline-terminated per line
    pub text: String,
    /// Participant lines found in the surviving text
    pub role_lines: Vec<RoleLine>,
    /// Whether the chunk showed an agent CLI's startup prompt
    pub agent_prompt: bool,
}

impl ClassifiedOutput {
    /// Whether nothing survived.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Turns raw terminal text into displayable text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputPipeline {
    mode: FilterMode,
}

impl OutputPipeline {
    /// Create a pipeline with the given filter mode.
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    /// Filter mode in use.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Whether a single (already stripped) line is dropped before display.
    pub fn drops(&self, line: &str) -> bool {
        if self.mode == FilterMode::StripOnly {
            return false;
        }
        let cleaned = clean_line(line);
        is_noise(&cleaned)
            || is_gibberish(&cleaned)
            || is_trivial_text(&cleaned)
            || is_setup_echo(&cleaned)
    }

    /// Strip control sequences, then drop filtered lines.
    ///
    /// Line terminators of surviving lines are normalized to `\n`; a final
    /// line without a terminator stays unterminated.
    pub fn classify(&self, raw: &str) -> String {
        let stripped = strip_control_sequences(raw);
        if self.mode == FilterMode::StripOnly {
            return stripped;
        }

        let mut out = String::with_capacity(stripped.len());
        for segment in stripped.split_inclusive('\n') {
            let (body, terminated) = match segment.strip_suffix('\n') {
                Some(body) => (body.trim_end_matches('\r'), true),
                None => (segment, false),
            };
            if self.drops(body) {
                trace!("Dropping line: {:?}", body);
                continue;
            }
            out.push_str(body);
            if terminated {
                out.push('\n');
            }
        }
        out
    }

    /// Run a chunk through the whole pipeline, extracting `<name>:` lines
    /// for the given participant when one is known.
    pub fn process(&self, raw: &str, participant: Option<&RoleLineParser>) -> ClassifiedOutput {
        let agent_prompt = looks_like_agent_prompt(&strip_control_sequences(raw));
        let text = self.classify(raw);
        let role_lines = participant
            .map(|parser| text.lines().filter_map(|line| parser.parse(line)).collect())
            .unwrap_or_default();

        ClassifiedOutput {
            text,
            role_lines,
            agent_prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_colored_line() {
        let pipeline = OutputPipeline::default();
        assert_eq!(pipeline.classify("\u{1b}[31mHello\u{1b}[0m\n"), "Hello\n");
    }

    #[test]
    fn test_classify_drops_noise_lines() {
        let pipeline = OutputPipeline::new(FilterMode::Filtered);
        let raw = "Build finished\r\n\x1b[2mesc to interrupt\x1b[0m\r\n\r\n--\r\nAll 12 tests passed\r\n";
        assert_eq!(pipeline.classify(raw), "Build finished\nAll 12 tests passed\n");
    }

    #[test]
    fn test_classify_keeps_unterminated_tail() {
        let pipeline = OutputPipeline::default();
        assert_eq!(pipeline.classify("first line\nsecond"), "first line\nsecond");
    }

    #[test]
    fn test_classify_drops_setup_echo() {
        let pipeline = OutputPipeline::default();
        let raw = "(Team Settings file path: /srv/core. read the md files) hi\nhello back\n";
        assert_eq!(pipeline.classify(raw), "hello back\n");
    }

    #[test]
    fn test_strip_only_keeps_everything_but_escapes() {
        let pipeline = OutputPipeline::new(FilterMode::StripOnly);
        let raw = "\x1b[1mModel: gpt-x\x1b[0m\r\n.\r\n";
        assert_eq!(pipeline.classify(raw), "Model: gpt-x\r\n.\r\n");
        assert!(!pipeline.drops("mmmm"));
    }

    #[test]
    fn test_process_extracts_role_lines() {
        let pipeline = OutputPipeline::default();
        let parser = RoleLineParser::new("Ann");
        let out = pipeline.process("Ann: the migration is done\nunrelated output\n", Some(&parser));
        assert_eq!(out.role_lines.len(), 1);
        assert_eq!(out.role_lines[0].text, "the migration is done");
        assert!(!out.agent_prompt);
    }

    #[test]
    fn test_process_flags_agent_prompt() {
        let pipeline = OutputPipeline::default();
        let out = pipeline.process("\x1b[1m? for shortcuts\x1b[0m", None);
        assert!(out.agent_prompt);
        assert!(out.role_lines.is_empty());
    }

    #[test]
    fn test_process_everything_filtered() {
        let pipeline = OutputPipeline::default();
        let out = pipeline.process("\x1b[?25l\r\n", None);
        assert!(out.is_empty());
    }
}
