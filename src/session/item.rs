use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::config::{SENTENCE_MAX_LEN_RANGE, WORD_MAX_LEN_RANGE, WordListKind};
use crate::generator::lists::filter_by_len;
use crate::generator::stream::random_word;
use crate::session::round::{RoundUpdate, TextRound};
use crate::session::{Counters, Mode, PracticeContext, SessionStatus};
use crate::store::stats::{ModeEvent, StatsStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Word,
    Sentence,
}

impl ItemKind {
    pub fn mode(self) -> Mode {
        match self {
            ItemKind::Word => Mode::Word,
            ItemKind::Sentence => Mode::Sentence,
        }
    }

    /// Sentences may contain spaces the typist does not have to enter.
    pub fn allows_skipped_spaces(self) -> bool {
        matches!(self, ItemKind::Sentence)
    }
}

fn choose_from<R: rand::Rng>(candidates: &[&str], rng: &mut R) -> Option<String> {
    candidates.choose(rng).map(|s| s.to_string())
}

/// Pick a word according to the configured word list.
pub fn pick_word<R: rand::Rng>(ctx: &PracticeContext, rng: &mut R) -> String {
    let max_len = ctx
        .config
        .word_max_len
        .clamp(WORD_MAX_LEN_RANGE.0, WORD_MAX_LEN_RANGE.1);
    let basic = &ctx.lists.words;
    let picked = match ctx.config.word_list {
        WordListKind::All => Some(random_word(&ctx.pool(), max_len, rng)),
        WordListKind::Custom => {
            let words = ctx
                .active_word_set()
                .map(|set| set.words.as_slice())
                .unwrap_or_default();
            if words.is_empty() {
                let all: Vec<&str> = basic.iter().map(String::as_str).collect();
                choose_from(&all, rng)
            } else {
                choose_from(&filter_by_len(words, max_len), rng)
            }
        }
        WordListKind::Basic => choose_from(&filter_by_len(basic, max_len), rng),
    };
    picked
        .filter(|word| !word.is_empty())
        .unwrap_or_else(|| random_word(&ctx.pool(), max_len, rng))
}

/// Pick a sentence no longer than the configured maximum, if any fits.
pub fn pick_sentence<R: rand::Rng>(ctx: &PracticeContext, rng: &mut R) -> String {
    let max_len = ctx
        .config
        .sentence_max_len
        .clamp(SENTENCE_MAX_LEN_RANGE.0, SENTENCE_MAX_LEN_RANGE.1);
    choose_from(&filter_by_len(&ctx.lists.sentences, max_len), rng)
        .unwrap_or_else(|| random_word(&ctx.pool(), max_len, rng))
}

/// Word or sentence practice: one item at a time, next item on completion.
pub struct ItemSession {
    kind: ItemKind,
    status: SessionStatus,
    round: Option<TextRound>,
    counters: Counters,
    rng: SmallRng,
}

impl ItemSession {
    pub fn new(kind: ItemKind) -> Self {
        Self::with_rng(kind, SmallRng::from_entropy())
    }

    pub fn with_rng(kind: ItemKind, rng: SmallRng) -> Self {
        Self {
            kind,
            status: SessionStatus::Idle,
            round: None,
            counters: Counters::default(),
            rng,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn round(&self) -> Option<&TextRound> {
        self.round.as_ref()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn start(&mut self, ctx: &PracticeContext) {
        match self.status {
            SessionStatus::Running => return,
            SessionStatus::Paused => {
                self.resume();
                return;
            }
            SessionStatus::Idle => {}
        }
        self.counters = Counters::default();
        self.status = SessionStatus::Running;
        self.next_item(ctx);
        tracing::info!(kind = ?self.kind, "item practice started");
    }

    pub fn pause(&mut self) {
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Running;
        }
    }

    pub fn stop(&mut self) {
        if self.status == SessionStatus::Idle {
            return;
        }
        self.status = SessionStatus::Idle;
        self.round = None;
        tracing::info!(
            kind = ?self.kind,
            completed = self.counters.completed,
            correct = self.counters.correct,
            wrong = self.counters.wrong,
            "item practice stopped"
        );
    }

    /// Swap in a new item when the list settings changed mid-run.
    pub fn refresh(&mut self, ctx: &PracticeContext) {
        if self.status == SessionStatus::Running {
            self.next_item(ctx);
        }
    }

    pub fn apply_buffer(
        &mut self,
        ctx: &PracticeContext,
        stats: &mut StatsStore,
        buffer: &str,
    ) -> Option<RoundUpdate> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let mode = self.kind.mode();
        let round = self.round.as_mut()?;
        let update = round.apply(buffer);
        for hit in &update.resolved {
            if hit.correct {
                self.counters.correct += 1;
                stats.record_correct(hit.expected);
                stats.record_mode_event(mode, ModeEvent::Correct);
            } else {
                self.counters.wrong += 1;
                stats.record_wrong(hit.expected);
                stats.record_mode_event(mode, ModeEvent::Wrong);
            }
        }
        if update.complete {
            self.counters.completed += 1;
            stats.record_mode_event(mode, ModeEvent::ItemCompleted);
            self.next_item(ctx);
        }
        Some(update)
    }

    fn next_item(&mut self, ctx: &PracticeContext) {
        let target = match self.kind {
            ItemKind::Word => pick_word(ctx, &mut self.rng),
            ItemKind::Sentence => pick_sentence(ctx, &mut self.rng),
        };
        tracing::debug!(kind = ?self.kind, %target, "next item");
        self.round = Some(TextRound::new(&target, self.kind.allows_skipped_spaces()));
    }
}
