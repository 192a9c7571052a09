use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::engine::compose;
use crate::keyboard::compose_keys::{KeyComposer, KeyInput, Release};
use crate::session::drill::DrillSession;
use crate::session::item::{ItemKind, ItemSession};
use crate::session::stream::StreamSession;
use crate::session::{Mode, PracticeContext, SessionStatus};
use crate::store::stats::StatsStore;

/// Owns the four practice sessions and the shared stats store, and keeps at
/// most one session out of `Idle`.
pub struct Trainer {
    pub drill: DrillSession,
    pub stream: StreamSession,
    pub word: ItemSession,
    pub sentence: ItemSession,
    stats: StatsStore,
    composer: KeyComposer,
}

impl Trainer {
    pub fn new(stats: StatsStore) -> Self {
        Self {
            drill: DrillSession::default(),
            stream: StreamSession::default(),
            word: ItemSession::new(ItemKind::Word),
            sentence: ItemSession::new(ItemKind::Sentence),
            stats,
            composer: KeyComposer::default(),
        }
    }

    /// Deterministic target selection, for tests and benchmarks.
    pub fn with_seed(stats: StatsStore, seed: u64) -> Self {
        Self {
            drill: DrillSession::with_rng(SmallRng::seed_from_u64(seed)),
            stream: StreamSession::with_rng(SmallRng::seed_from_u64(seed.wrapping_add(1))),
            word: ItemSession::with_rng(ItemKind::Word, SmallRng::seed_from_u64(seed.wrapping_add(2))),
            sentence: ItemSession::with_rng(
                ItemKind::Sentence,
                SmallRng::seed_from_u64(seed.wrapping_add(3)),
            ),
            stats,
            composer: KeyComposer::default(),
        }
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn composer(&self) -> &KeyComposer {
        &self.composer
    }

    pub fn status(&self, mode: Mode) -> SessionStatus {
        match mode {
            Mode::Drill => self.drill.status(),
            Mode::Stream => self.stream.status(),
            Mode::Word => self.word.status(),
            Mode::Sentence => self.sentence.status(),
        }
    }

    /// The session that is running or paused, if any.
    pub fn active_mode(&self) -> Option<Mode> {
        Mode::ALL
            .into_iter()
            .find(|&mode| self.status(mode) != SessionStatus::Idle)
    }

    fn running_mode(&self) -> Option<Mode> {
        Mode::ALL
            .into_iter()
            .find(|&mode| self.status(mode) == SessionStatus::Running)
    }

    /// Start `mode`, or resume it if paused. Every other session is stopped
    /// first without recording a stream run.
    pub fn start(&mut self, mode: Mode, ctx: &PracticeContext, now: Instant) {
        match self.status(mode) {
            SessionStatus::Running => return,
            SessionStatus::Paused => {
                self.resume(mode, ctx, now);
                return;
            }
            SessionStatus::Idle => {}
        }
        for other in Mode::ALL.into_iter().filter(|&m| m != mode) {
            self.stop_with(other, false, now);
        }
        self.composer.clear();
        match mode {
            Mode::Drill => self.drill.start(ctx),
            Mode::Stream => self.stream.start(ctx, now),
            Mode::Word => self.word.start(ctx),
            Mode::Sentence => self.sentence.start(ctx),
        }
        self.stats.flush();
    }

    pub fn pause(&mut self, mode: Mode, now: Instant) {
        self.composer.clear();
        match mode {
            Mode::Drill => self.drill.pause(),
            Mode::Stream => self.stream.pause(now),
            Mode::Word => self.word.pause(),
            Mode::Sentence => self.sentence.pause(),
        }
    }

    pub fn resume(&mut self, mode: Mode, ctx: &PracticeContext, now: Instant) {
        match mode {
            Mode::Drill => self.drill.resume(ctx),
            Mode::Stream => self.stream.resume(now),
            Mode::Word => self.word.resume(),
            Mode::Sentence => self.sentence.resume(),
        }
    }

    /// Explicit stop; a stream run counts towards the stats.
    pub fn stop(&mut self, mode: Mode, now: Instant) {
        self.stop_with(mode, true, now);
        self.stats.flush();
    }

    fn stop_with(&mut self, mode: Mode, record: bool, now: Instant) {
        if self.status(mode) == SessionStatus::Idle {
            return;
        }
        self.composer.clear();
        match mode {
            Mode::Drill => self.drill.stop(),
            Mode::Stream => self.stream.stop(&mut self.stats, record, now),
            Mode::Word => self.word.stop(),
            Mode::Sentence => self.sentence.stop(),
        }
    }

    /// Leaving the practice screens: everything stops, nothing is recorded.
    pub fn stop_all(&mut self, now: Instant) {
        for mode in Mode::ALL {
            self.stop_with(mode, false, now);
        }
        self.stats.flush();
    }

    pub fn pause_all(&mut self, now: Instant) {
        for mode in Mode::ALL {
            self.pause(mode, now);
        }
    }

    /// The next character the running session expects.
    pub fn expected_char(&self) -> Option<char> {
        match self.running_mode()? {
            Mode::Drill => self.drill.target(),
            Mode::Stream => self.stream.round()?.expected_char(),
            Mode::Word => self.word.round()?.expected_char(),
            Mode::Sentence => self.sentence.round()?.expected_char(),
        }
    }

    /// Physical key a mapped-mode typist should press next. A voiced kana
    /// with no key of its own points at its base, then at the mark once the
    /// base is held.
    pub fn expected_key<'a>(&'a self, ctx: &'a PracticeContext) -> Option<&'a str> {
        if self.running_mode()? == Mode::Drill {
            return self.drill.target_key();
        }
        let expected = self.expected_char()?;
        if let Some(code) = ctx.keymap.key_for(expected) {
            return Some(code);
        }
        let parts = compose::decompose(expected)?;
        if self.composer.pending().is_some() {
            ctx.keymap.key_for(parts.mark)
        } else {
            ctx.keymap.key_for(parts.base)
        }
    }

    /// A physical key press in mapped mode. Base kana may be held until the
    /// next key shows whether a voicing mark follows.
    pub fn press_key(&mut self, ctx: &PracticeContext, code: &str, now: Instant) {
        if self.running_mode().is_none() {
            return;
        }
        let Some(ch) = ctx.keymap.resolve(code) else {
            return;
        };
        let key = KeyInput::new(ch, code);
        match self.composer.release(&key) {
            Release::Combined(voiced) => {
                self.submit(ctx, Some(&voiced.code), voiced.ch, now);
                self.stats.flush();
                return;
            }
            Release::Flushed(held) => self.submit(ctx, Some(&held.code), held.ch, now),
            Release::Empty => {}
        }
        let expected = self.expected_char();
        if let Some(key) = self.composer.hold_or_pass(key, expected) {
            self.submit(ctx, Some(&key.code), key.ch, now);
        }
        self.stats.flush();
    }

    /// A character delivered ready-made by the terminal (native input).
    pub fn type_char(&mut self, ctx: &PracticeContext, ch: char, now: Instant) {
        self.submit(ctx, None, ch, now);
        self.stats.flush();
    }

    /// Backspace drops a held base kana first, then edits the text buffer.
    pub fn backspace(&mut self, ctx: &PracticeContext) {
        if self.composer.clear() {
            return;
        }
        let Some(mode) = self.running_mode() else {
            return;
        };
        let Some(buffer) = self.buffer_of(mode).map(|mut buf| {
            buf.pop();
            buf
        }) else {
            return;
        };
        self.apply_buffer(ctx, mode, &buffer);
    }

    /// Text typed so far in the running text session.
    pub fn buffer(&self) -> Option<String> {
        self.buffer_of(self.running_mode()?)
    }

    /// Replace the whole text buffer of the running text session.
    pub fn set_buffer(&mut self, ctx: &PracticeContext, buffer: &str) {
        if let Some(mode) = self.running_mode()
            && mode != Mode::Drill
        {
            self.apply_buffer(ctx, mode, buffer);
        }
    }

    /// Drive deadlines: drill advance and stream timer.
    pub fn tick(&mut self, ctx: &PracticeContext, now: Instant) {
        self.drill.tick(ctx, now);
        if self.stream.tick(&mut self.stats, now) {
            self.composer.clear();
        }
        self.stats.flush();
    }

    /// Pick a fresh word/sentence after the list settings changed.
    pub fn refresh_items(&mut self, ctx: &PracticeContext) {
        self.word.refresh(ctx);
        self.sentence.refresh(ctx);
    }

    fn buffer_of(&self, mode: Mode) -> Option<String> {
        let round = match mode {
            Mode::Drill => return None,
            Mode::Stream => self.stream.round(),
            Mode::Word => self.word.round(),
            Mode::Sentence => self.sentence.round(),
        }?;
        Some(round.buffer_string())
    }

    fn submit(&mut self, ctx: &PracticeContext, code: Option<&str>, ch: char, now: Instant) {
        let Some(mode) = self.running_mode() else {
            return;
        };
        if mode == Mode::Drill {
            self.drill.submit(ctx, &mut self.stats, code, ch, now);
            return;
        }
        if let Some(mut buffer) = self.buffer_of(mode) {
            buffer.push(ch);
            self.apply_buffer(ctx, mode, &buffer);
        }
    }

    fn apply_buffer(&mut self, ctx: &PracticeContext, mode: Mode, buffer: &str) {
        match mode {
            Mode::Drill => {}
            Mode::Stream => {
                self.stream.apply_buffer(ctx, &mut self.stats, buffer);
            }
            Mode::Word => {
                self.word.apply_buffer(ctx, &mut self.stats, buffer);
            }
            Mode::Sentence => {
                self.sentence.apply_buffer(ctx, &mut self.stats, buffer);
            }
        }
        self.stats.flush();
    }
}
