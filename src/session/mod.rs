pub mod clock;
pub mod drill;
pub mod item;
pub mod round;
pub mod stream;
pub mod trainer;

use crate::config::{Config, InputMode};
use crate::engine::pool;
use crate::generator::lists::BuiltinLists;
use crate::generator::word_sets::WordSet;
use crate::keyboard::keymap::KeyMap;

pub use trainer::Trainer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Drill,
    Stream,
    Word,
    Sentence,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Drill, Mode::Stream, Mode::Word, Mode::Sentence];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Drill => "Kana Drill",
            Mode::Stream => "Stream",
            Mode::Word => "Words",
            Mode::Sentence => "Sentences",
        }
    }
}

/// Per-run counters shown next to a session; reset on every start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub correct: u32,
    pub wrong: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub completed: u32,
}

impl Counters {
    /// Accuracy in percent, `None` before the first keystroke.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.correct + self.wrong;
        if total == 0 {
            return None;
        }
        Some(self.correct as f64 / total as f64 * 100.0)
    }
}

/// Everything a session reads from the outside when it picks targets and
/// judges input. Built fresh from the current settings for each call.
#[derive(Clone, Copy)]
pub struct PracticeContext<'a> {
    pub config: &'a Config,
    pub keymap: &'a KeyMap,
    pub word_sets: &'a [WordSet],
    pub lists: &'a BuiltinLists,
}

impl PracticeContext<'_> {
    pub fn is_mapped(&self) -> bool {
        self.config.input_mode == InputMode::Mapped
    }

    /// Candidate kana for drill and stream targets.
    pub fn pool(&self) -> Vec<char> {
        pool::build_or_default(&self.config.enabled_groups(), self.is_mapped(), self.keymap)
    }

    pub fn active_word_set(&self) -> Option<&WordSet> {
        self.word_sets
            .iter()
            .find(|set| set.id == self.config.word_set_id)
    }
}
