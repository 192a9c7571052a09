use crate::session::Mode;
use crate::store::kv::{self, KeyValueStore};
use crate::store::schema::{SCHEMA_VERSION, StatsData};

pub const STATS_KEY: &str = "stats";

/// A run-level or keystroke-level fact reported by a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeEvent {
    Correct,
    Wrong,
    /// A word, sentence or whole stream was finished.
    ItemCompleted,
    /// Current drill streak; kept as a high-water mark.
    Streak(u32),
    /// A timed stream run ended with this speed.
    Run { kpm: u32 },
}

/// Lifetime statistics shared by every session.
///
/// Mutations only mark the store dirty; [`StatsStore::flush`] persists them.
pub struct StatsStore {
    data: StatsData,
    backend: Box<dyn KeyValueStore>,
    dirty: bool,
}

impl StatsStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        let mut data: StatsData = kv::load_json(backend.as_ref(), STATS_KEY);
        if data.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                found = data.schema_version,
                expected = SCHEMA_VERSION,
                "stats schema mismatch, starting fresh"
            );
            data = StatsData::default();
        }
        Self {
            data,
            backend,
            dirty: false,
        }
    }

    pub fn record_correct(&mut self, ch: char) {
        if ch == ' ' {
            return;
        }
        self.data.kana.entry(ch).or_default().correct += 1;
        self.dirty = true;
    }

    pub fn record_wrong(&mut self, ch: char) {
        if ch == ' ' {
            return;
        }
        self.data.kana.entry(ch).or_default().wrong += 1;
        self.dirty = true;
    }

    pub fn record_mode_event(&mut self, mode: Mode, event: ModeEvent) {
        let data = &mut self.data;
        match (mode, event) {
            (Mode::Drill, ModeEvent::Correct) => data.practice.correct += 1,
            (Mode::Drill, ModeEvent::Wrong) => data.practice.wrong += 1,
            (Mode::Drill, ModeEvent::Streak(streak)) => {
                data.practice.best_streak = data.practice.best_streak.max(streak);
            }
            (Mode::Stream, ModeEvent::Correct) => data.typing.correct += 1,
            (Mode::Stream, ModeEvent::Wrong) => data.typing.wrong += 1,
            (Mode::Stream, ModeEvent::ItemCompleted) => data.typing.streams += 1,
            (Mode::Stream, ModeEvent::Run { kpm }) => {
                data.typing.runs += 1;
                data.typing.best_kpm = data.typing.best_kpm.max(kpm);
            }
            (Mode::Word, ModeEvent::Correct) => data.word.correct += 1,
            (Mode::Word, ModeEvent::Wrong) => data.word.wrong += 1,
            (Mode::Word, ModeEvent::ItemCompleted) => data.word.words += 1,
            (Mode::Sentence, ModeEvent::Correct) => data.sentence.correct += 1,
            (Mode::Sentence, ModeEvent::Wrong) => data.sentence.wrong += 1,
            (Mode::Sentence, ModeEvent::ItemCompleted) => data.sentence.sentences += 1,
            (mode, event) => {
                tracing::debug!(?mode, ?event, "event has no stats counter");
                return;
            }
        }
        self.dirty = true;
    }

    pub fn snapshot(&self) -> &StatsData {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear every counter and persist the empty stats right away.
    pub fn reset(&mut self) {
        self.data = StatsData::default();
        self.dirty = true;
        self.flush();
        tracing::info!("stats reset");
    }

    /// Persist pending changes. Failures are logged and retried on the next
    /// flush.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        match kv::save_json(self.backend.as_mut(), STATS_KEY, &self.data) {
            Ok(()) => self.dirty = false,
            Err(err) => tracing::warn!(%err, "could not save stats"),
        }
    }
}
