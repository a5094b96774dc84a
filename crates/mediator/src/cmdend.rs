//! Command-end detection (spec §4.5 "Command-end detector", §9 "Prompt
//! detection is heuristic").

use regex::Regex;

const TAIL_LIMIT: usize = 300;

/// One command's worth of detector state. The marker strategy withholds
/// up to [`TAIL_LIMIT`] trailing chars so a marker straddling a chunk
/// boundary is still matched, and erases the marker (and anything after
/// it that belonged to the match) before the text reaches the terminal.
/// The prompt-regex strategy never withholds or erases anything — it
/// only watches a bounded tail for the pattern (spec §8 scenario 4).
pub enum Strategy {
    MarkerEcho(Regex),
    PromptRegex(Regex),
}

impl Strategy {
    /// `echo cmd has finished with code $?$PWD.` once the shell expands
    /// `$?` and `$PWD` (spec §4.5, §9 "marker-echo").
    pub fn marker_echo() -> Self {
        Self::MarkerEcho(Regex::new(r"cmd has finished with code (-?\d+)(/\S*)\.\r?\n?").expect("valid regex"))
    }

    /// `[$#]\s*\r?$`, the glossary's "Prompt regex".
    pub fn prompt_regex() -> Self {
        Self::PromptRegex(Regex::new(r"(?m)[$#]\s*\r?$").expect("valid regex"))
    }
}

/// The sentinel command appended after each remote terminal command
/// when using the marker strategy.
pub const MARKER_SUFFIX: &str = "echo cmd has finished with code $?$PWD.\n";

pub struct DetectResult {
    /// Bytes safe to forward to the terminal right now.
    pub forward: String,
    /// Set once the command has finished; carries the shell's `$PWD`
    /// when the marker strategy produced it.
    pub finished: Option<Option<String>>,
}

pub struct CommandEndDetector {
    strategy: Strategy,
    tail: String,
}

impl CommandEndDetector {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            tail: String::new(),
        }
    }

    pub fn feed(&mut self, chunk: &str) -> DetectResult {
        match &self.strategy {
            Strategy::PromptRegex(re) => self.feed_prompt_regex(re.clone(), chunk),
            Strategy::MarkerEcho(re) => self.feed_marker(re.clone(), chunk),
        }
    }

    fn feed_prompt_regex(&mut self, re: Regex, chunk: &str) -> DetectResult {
        self.tail.push_str(chunk);
        if self.tail.chars().count() > TAIL_LIMIT {
            let excess = self.tail.chars().count() - TAIL_LIMIT;
            self.tail = self.tail.chars().skip(excess).collect();
        }
        let finished = if re.is_match(&self.tail) {
            self.tail.clear();
            Some(None)
        } else {
            None
        };
        DetectResult {
            forward: chunk.to_string(),
            finished,
        }
    }

    fn feed_marker(&mut self, re: Regex, chunk: &str) -> DetectResult {
        let combined = format!("{}{}", self.tail, chunk);
        if let Some(m) = re.find(&combined) {
            // Only the marker's own matched bytes are erased; anything
            // that arrived after it in the same chunk (typically the
            // next shell prompt) must still reach the terminal.
            let mut forward = combined[..m.start()].to_string();
            forward.push_str(&combined[m.end()..]);
            self.tail.clear();
            let pwd = re
                .captures(&combined)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str().to_string());
            return DetectResult {
                forward,
                finished: Some(pwd),
            };
        }
        let char_count = combined.chars().count();
        if char_count > TAIL_LIMIT {
            let forward_count = char_count - TAIL_LIMIT;
            let forward: String = combined.chars().take(forward_count).collect();
            self.tail = combined.chars().skip(forward_count).collect();
            DetectResult {
                forward,
                finished: None,
            }
        } else {
            self.tail = combined;
            DetectResult {
                forward: String::new(),
                finished: None,
            }
        }
    }

    /// Flushes any withheld bytes once a command is known to be over
    /// (e.g. the mediator is about to show a prompt regardless).
    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_strategy_erases_the_marker_and_captures_pwd() {
        let mut detector = CommandEndDetector::new(Strategy::marker_echo());
        let result = detector.feed("output\ncmd has finished with code 0/home/alice.\n");
        assert_eq!(result.forward, "output\n");
        assert_eq!(result.finished, Some(Some("/home/alice".to_string())));
    }

    #[test]
    fn text_after_the_marker_in_the_same_chunk_is_still_forwarded() {
        let mut detector = CommandEndDetector::new(Strategy::marker_echo());
        let result = detector.feed("output\ncmd has finished with code 0/home/alice.\n$ ");
        assert_eq!(result.forward, "output\n$ ");
        assert_eq!(result.finished, Some(Some("/home/alice".to_string())));
    }

    #[test]
    fn marker_straddling_a_chunk_boundary_is_still_found() {
        let mut detector = CommandEndDetector::new(Strategy::marker_echo());
        let r1 = detector.feed("hello cmd has finished with");
        assert_eq!(r1.finished, None);
        let r2 = detector.feed(" code 0/tmp.\n");
        assert_eq!(r2.finished, Some(Some("/tmp".to_string())));
    }

    #[test]
    fn prompt_regex_strategy_never_erases_anything() {
        let mut detector = CommandEndDetector::new(Strategy::prompt_regex());
        let result = detector.feed("user@host:/home$ ");
        assert_eq!(result.forward, "user@host:/home$ ");
        assert_eq!(result.finished, Some(None));
    }
}
