use crate::engine::align::{self, Alignment, InputState};

/// One target position settled by a buffer change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub expected: char,
    pub correct: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundUpdate {
    /// Positions resolved by input that was not in the previous buffer.
    pub resolved: Vec<Resolved>,
    pub complete: bool,
}

/// A target string and the text typed against it so far.
#[derive(Clone, Debug)]
pub struct TextRound {
    target: Vec<char>,
    buffer: Vec<char>,
    alignment: Alignment,
    allow_skip_spaces: bool,
}

impl TextRound {
    pub fn new(target: &str, allow_skip_spaces: bool) -> Self {
        let target: Vec<char> = target.chars().collect();
        let alignment = align::evaluate(&target, &[], allow_skip_spaces);
        Self {
            target,
            buffer: Vec::new(),
            alignment,
            allow_skip_spaces,
        }
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn target_string(&self) -> String {
        self.target.iter().collect()
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn buffer_string(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn progress(&self) -> usize {
        self.alignment.progress
    }

    pub fn is_complete(&self) -> bool {
        self.alignment.is_complete(self.target.len())
    }

    /// The next target character the typist has to produce.
    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.alignment.progress).copied()
    }

    /// Replace the buffer with `raw` and re-align from scratch.
    ///
    /// The input is NFC-normalized and clamped to what the target can absorb.
    /// Only input positions past the prefix shared with the previous buffer
    /// are reported, so re-submitting an unchanged prefix never counts anything
    /// twice. A combining mark folding into the last kana changes that kana,
    /// which puts it past the shared prefix.
    pub fn apply(&mut self, raw: &str) -> RoundUpdate {
        let normalized: Vec<char> = align::normalize_input(raw).chars().collect();
        let clamped = align::clamp_input(&normalized, &self.target).to_vec();
        let alignment = align::evaluate(&self.target, &clamped, self.allow_skip_spaces);

        let unchanged = self
            .buffer
            .iter()
            .zip(&clamped)
            .take_while(|(old, new)| old == new)
            .count();
        let mut resolved = Vec::new();
        for i in unchanged..clamped.len() {
            let Some(ti) = alignment.input_to_target[i] else {
                continue;
            };
            let correct = match alignment.input_states[i] {
                InputState::Correct => true,
                InputState::Wrong => false,
                InputState::Pending | InputState::Ignored => continue,
            };
            resolved.push(Resolved {
                expected: self.target[ti],
                correct,
            });
        }

        self.buffer = clamped;
        self.alignment = alignment;
        RoundUpdate {
            resolved,
            complete: self.is_complete(),
        }
    }

    pub fn push_char(&mut self, ch: char) -> RoundUpdate {
        let mut raw = self.buffer_string();
        raw.push(ch);
        self.apply(&raw)
    }

    pub fn pop_char(&mut self) -> RoundUpdate {
        let mut raw = self.buffer_string();
        raw.pop();
        self.apply(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(update: &RoundUpdate) -> Vec<(char, bool)> {
        update
            .resolved
            .iter()
            .map(|r| (r.expected, r.correct))
            .collect()
    }

    #[test]
    fn test_counts_each_position_once() {
        let mut round = TextRound::new("ねこ", false);
        let update = round.apply("ね");
        assert_eq!(hits(&update), vec![('ね', true)]);
        assert!(!update.complete);

        // Same buffer again: nothing new.
        assert!(round.apply("ね").resolved.is_empty());

        let update = round.apply("ねこ");
        assert_eq!(hits(&update), vec![('こ', true)]);
        assert!(update.complete);
    }

    #[test]
    fn test_wrong_key_is_reported_against_expected() {
        let mut round = TextRound::new("ねこ", false);
        let update = round.apply("ろ");
        assert_eq!(hits(&update), vec![('ね', false)]);
        assert_eq!(round.expected_char(), Some('こ'));
    }

    #[test]
    fn test_voiced_pair_counts_once() {
        let mut round = TextRound::new("がっこう", false);
        let update = round.push_char('か');
        assert!(update.resolved.is_empty());
        assert_eq!(round.progress(), 0);
        assert_eq!(round.expected_char(), Some('が'));

        let update = round.push_char('゛');
        assert_eq!(hits(&update), vec![('が', true)]);
        assert_eq!(round.progress(), 1);
    }

    #[test]
    fn test_combining_mark_is_normalized() {
        let mut round = TextRound::new("が", false);
        let update = round.apply("か\u{3099}");
        assert_eq!(hits(&update), vec![('が', true)]);
        assert!(update.complete);
        assert_eq!(round.buffer(), &['が']);
    }

    #[test]
    fn test_combining_mark_typed_after_base_counts_once() {
        let mut round = TextRound::new("がこ", false);
        let update = round.push_char('か');
        assert!(update.resolved.is_empty());
        assert_eq!(round.progress(), 0);

        let update = round.push_char('\u{3099}');
        assert_eq!(hits(&update), vec![('が', true)]);
        assert_eq!(round.buffer(), &['が']);
        assert_eq!(round.progress(), 1);

        assert!(round.apply("が").resolved.is_empty());
        let update = round.push_char('こ');
        assert_eq!(hits(&update), vec![('こ', true)]);
        assert!(update.complete);
    }

    #[test]
    fn test_overflow_is_clamped() {
        let mut round = TextRound::new("ね", false);
        round.apply("ねこねこ");
        assert_eq!(round.buffer(), &['ね']);
    }

    #[test]
    fn test_backspace_then_retype_counts_again() {
        let mut round = TextRound::new("ねこ", false);
        round.apply("ろ");
        let update = round.pop_char();
        assert!(update.resolved.is_empty());
        assert_eq!(round.progress(), 0);
        let update = round.push_char('ね');
        assert_eq!(hits(&update), vec![('ね', true)]);
    }

    #[test]
    fn test_sentence_spaces_skip() {
        let mut round = TextRound::new("わたし は", true);
        let update = round.apply("わたしは");
        assert!(update.complete);
        assert_eq!(update.resolved.len(), 4);
        assert!(update.resolved.iter().all(|r| r.correct));
    }
}
