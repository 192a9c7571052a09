use crate::engine::compose::{compose, decompose, is_mark};

/// A resolved key press: the kana it produced and the physical key behind it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub ch: char,
    pub code: String,
}

impl KeyInput {
    pub fn new(ch: char, code: &str) -> Self {
        Self {
            ch,
            code: code.to_string(),
        }
    }
}

/// What happened to a held base kana when the next key arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Release {
    /// Nothing was held.
    Empty,
    /// The new key was the matching mark; submit the voiced kana instead of it.
    Combined(KeyInput),
    /// The held base must be submitted on its own before the new key.
    Flushed(KeyInput),
}

/// Physical-key composition layer: holds a base kana when the expected
/// character is its voiced form, so the next mark key can complete it.
#[derive(Clone, Debug, Default)]
pub struct KeyComposer {
    pending: Option<KeyInput>,
}

impl KeyComposer {
    pub fn pending(&self) -> Option<&KeyInput> {
        self.pending.as_ref()
    }

    /// Drop any held base without submitting it. Returns whether one was held.
    pub fn clear(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// First half of handling a new key: settle whatever is held.
    pub fn release(&mut self, next: &KeyInput) -> Release {
        let Some(held) = self.pending.take() else {
            return Release::Empty;
        };
        if is_mark(next.ch)
            && let Some(voiced) = compose(held.ch, next.ch)
        {
            return Release::Combined(KeyInput {
                ch: voiced,
                code: next.code.clone(),
            });
        }
        Release::Flushed(held)
    }

    /// Second half: hold `key` if it is the base of the `expected` voiced kana,
    /// otherwise hand it back for immediate submission.
    pub fn hold_or_pass(&mut self, key: KeyInput, expected: Option<char>) -> Option<KeyInput> {
        if is_mark(key.ch) {
            return Some(key);
        }
        let is_expected_base = expected
            .and_then(decompose)
            .is_some_and(|parts| parts.base == key.ch);
        if is_expected_base {
            self.pending = Some(key);
            None
        } else {
            Some(key)
        }
    }
}
