use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Static reference text every answer is grounded on.
///
/// Loaded once at startup and shared read-only between sessions.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    text: Arc<str>,
}

impl KnowledgeBase {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    /// Reads the whole file. A missing or unreadable file yields an empty
    /// knowledge base so the chat can still report the problem to the user.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!(path = %path.display(), chars = text.chars().count(), "knowledge base loaded");
                Self::new(text)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read knowledge base");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The first `max_chars` characters, or everything when `None`.
    /// A zero limit counts as no limit so non-empty knowledge is never dropped.
    pub fn excerpt(&self, max_chars: Option<usize>) -> &str {
        let Some(limit) = max_chars.filter(|&n| n > 0) else {
            return &self.text;
        };

        match self.text.char_indices().nth(limit) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_respects_char_boundaries() {
        let kb = KnowledgeBase::new("ÄÖÜ resistor");
        assert_eq!(kb.excerpt(Some(2)), "ÄÖ");
        assert_eq!(kb.excerpt(Some(100)), "ÄÖÜ resistor");
        assert_eq!(kb.excerpt(None), "ÄÖÜ resistor");
        assert_eq!(kb.excerpt(Some(0)), "ÄÖÜ resistor");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load(&dir.path().join("nope.txt"));
        assert!(kb.is_empty());
    }

    #[test]
    fn load_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.txt");
        fs::write(&path, "Arduino Uno uses an ATmega328P.\nPins: 14 digital.").unwrap();

        let kb = KnowledgeBase::load(&path);
        assert_eq!(kb.text(), "Arduino Uno uses an ATmega328P.\nPins: 14 digital.");
    }
}
