//! Sliding-window compression of prior phase outputs.
//!
//! Each outline phase must know what came before it without re-reading the
//! full text of every earlier volume — that would grow the prompt linearly
//! with generated content and eventually overflow the synthesizer's window.
//! [`ContextWindow`] keeps one line per prior volume (title and chapter
//! count only, title truncated), so the digest's size depends on the number
//! of phases, never on how much text those phases produced.

/// Bounded digest of previously generated volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextWindow {
    entries: Vec<String>,
}

impl ContextWindow {
    /// Seed line used when no volume has been generated yet.
    pub const SEED: &'static str =
        "This is the opening of the novel; no prior outline exists yet.";

    /// Longest volume title carried into the digest, in chars.
    pub const MAX_TITLE_CHARS: usize = 80;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed volume. Only its title and chapter count survive
    /// into the digest.
    pub fn push(&mut self, volume_no: usize, title: &str, chapter_count: usize) {
        let title: String = title.chars().take(Self::MAX_TITLE_CHARS).collect();
        self.entries
            .push(format!("Volume {volume_no}: {title} ({chapter_count} chapters)"));
    }

    /// Render the digest fed into the next phase's prompt.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return Self::SEED.to_string();
        }
        let mut rendered = String::from(Self::SEED);
        for entry in &self.entries {
            rendered.push('\n');
            rendered.push_str(entry);
        }
        rendered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
