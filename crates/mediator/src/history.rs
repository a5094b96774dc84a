//! Command history (spec §3 "Command history", §5 "single-producer/
//! single-consumer on the main thread; no locking required").

/// In-memory-only command history with a cursor for `ESC [ A`/`ESC [ B`
/// recall. Not persisted across sessions (spec's SUPPLEMENTED FEATURES
/// §2 deliberately keeps this in-process-only).
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: String) {
        if !line.is_empty() {
            self.entries.push(line);
        }
        self.cursor = None;
    }

    /// `ESC [ A`: recalls the entry before the current cursor position.
    pub fn prev(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let next_cursor = match self.cursor {
            None => self.entries.len() - 1,
            Some(0) => 0,
            Some(c) => c - 1,
        };
        self.cursor = Some(next_cursor);
        self.entries.get(next_cursor).map(String::as_str)
    }

    /// `ESC [ B`: recalls the entry after the current cursor position,
    /// or clears the line once past the newest entry.
    pub fn next(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(c) if c + 1 >= self.entries.len() => {
                self.cursor = None;
                None
            }
            Some(c) => {
                self.cursor = Some(c + 1);
                self.entries.get(c + 1).map(String::as_str)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prev_walks_backward_from_the_newest_entry() {
        let mut h = History::new();
        h.push("a".to_string());
        h.push("b".to_string());
        assert_eq!(h.prev(), Some("b"));
        assert_eq!(h.prev(), Some("a"));
        assert_eq!(h.prev(), Some("a"));
    }

    #[test]
    fn next_returns_to_an_empty_line_past_the_newest_entry() {
        let mut h = History::new();
        h.push("a".to_string());
        h.push("b".to_string());
        h.prev();
        h.prev();
        assert_eq!(h.next(), Some("b"));
        assert_eq!(h.next(), None);
    }

    #[test]
    fn empty_history_recalls_nothing() {
        let mut h = History::new();
        assert_eq!(h.prev(), None);
        assert_eq!(h.next(), None);
    }
}
