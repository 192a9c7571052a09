use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{STREAM_LENGTH_RANGE, TIMER_SECONDS_RANGE};
use crate::generator::stream::kana_stream;
use crate::session::clock::ElapsedClock;
use crate::session::round::{RoundUpdate, TextRound};
use crate::session::{Counters, Mode, PracticeContext, SessionStatus};
use crate::store::stats::{ModeEvent, StatsStore};

/// Correct kana per minute, rounded; zero before any time has passed.
pub fn kpm(correct: u32, elapsed: Duration) -> u32 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0;
    }
    (correct as f64 / minutes).round() as u32
}

/// Continuous typing over generated kana streams, optionally timed.
pub struct StreamSession {
    status: SessionStatus,
    round: Option<TextRound>,
    counters: Counters,
    clock: ElapsedClock,
    duration: Option<Duration>,
    length: usize,
    last_kpm: Option<u32>,
    rng: SmallRng,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl StreamSession {
    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            status: SessionStatus::Idle,
            round: None,
            counters: Counters::default(),
            clock: ElapsedClock::default(),
            duration: None,
            length: STREAM_LENGTH_RANGE.0,
            last_kpm: None,
            rng,
        }
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

    /// Time limit of the current run; `None` when untimed.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Speed of the last finished run.
    pub fn last_kpm(&self) -> Option<u32> {
        self.last_kpm
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    /// Whole seconds left, rounded to nearest; `None` when untimed.
    pub fn remaining_secs(&self, now: Instant) -> Option<u64> {
        let duration = self.duration?;
        let left = duration.saturating_sub(self.clock.elapsed(now));
        Some(left.as_secs_f64().round() as u64)
    }

    pub fn kpm(&self, now: Instant) -> u32 {
        kpm(self.counters.correct, self.clock.elapsed(now))
    }

    pub fn start(&mut self, ctx: &PracticeContext, now: Instant) {
        match self.status {
            SessionStatus::Running => return,
            SessionStatus::Paused => {
                self.resume(now);
                return;
            }
            SessionStatus::Idle => {}
        }
        let config = ctx.config;
        self.length = config
            .stream_length
            .clamp(STREAM_LENGTH_RANGE.0, STREAM_LENGTH_RANGE.1);
        self.duration = config.timer_enabled.then(|| {
            let secs = config
                .timer_seconds
                .clamp(TIMER_SECONDS_RANGE.0, TIMER_SECONDS_RANGE.1);
            Duration::from_secs(u64::from(secs))
        });
        self.counters = Counters::default();
        self.last_kpm = None;
        self.new_round(ctx);
        self.clock.start(now);
        self.status = SessionStatus::Running;
        tracing::info!(
            length = self.length,
            timer_secs = self.duration.map(|d| d.as_secs()),
            "stream started"
        );
    }

    pub fn pause(&mut self, now: Instant) {
        if self.status != SessionStatus::Running {
            return;
        }
        self.clock.pause(now);
        self.status = SessionStatus::Paused;
    }

    pub fn resume(&mut self, now: Instant) {
        if self.status != SessionStatus::Paused {
            return;
        }
        self.clock.resume(now);
        self.status = SessionStatus::Running;
    }

    /// End the run. With `record`, the run count and best speed are updated.
    pub fn stop(&mut self, stats: &mut StatsStore, record: bool, now: Instant) {
        if self.status == SessionStatus::Idle {
            return;
        }
        let elapsed = self.clock.stop(now);
        let kpm = kpm(self.counters.correct, elapsed);
        if record {
            stats.record_mode_event(Mode::Stream, ModeEvent::Run { kpm });
        }
        self.last_kpm = Some(kpm);
        self.status = SessionStatus::Idle;
        self.round = None;
        tracing::info!(
            kpm,
            record,
            correct = self.counters.correct,
            wrong = self.counters.wrong,
            elapsed_secs = elapsed.as_secs_f64(),
            "stream stopped"
        );
    }

    /// Stop with stats once the timer runs out. Returns whether it did.
    pub fn tick(&mut self, stats: &mut StatsStore, now: Instant) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        let Some(duration) = self.duration else {
            return false;
        };
        if self.clock.elapsed(now) >= duration {
            self.stop(stats, true, now);
            return true;
        }
        false
    }

    /// Re-align the typed text. A finished stream is replaced immediately.
    pub fn apply_buffer(
        &mut self,
        ctx: &PracticeContext,
        stats: &mut StatsStore,
        buffer: &str,
    ) -> Option<RoundUpdate> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let round = self.round.as_mut()?;
        let update = round.apply(buffer);
        for hit in &update.resolved {
            if hit.correct {
                self.counters.correct += 1;
                stats.record_correct(hit.expected);
                stats.record_mode_event(Mode::Stream, ModeEvent::Correct);
            } else {
                self.counters.wrong += 1;
                stats.record_wrong(hit.expected);
                stats.record_mode_event(Mode::Stream, ModeEvent::Wrong);
            }
        }
        if update.complete {
            self.counters.completed += 1;
            stats.record_mode_event(Mode::Stream, ModeEvent::ItemCompleted);
            self.new_round(ctx);
        }
        Some(update)
    }

    fn new_round(&mut self, ctx: &PracticeContext) {
        let target = kana_stream(&ctx.pool(), self.length, &mut self.rng);
        self.round = Some(TextRound::new(&target, false));
    }
}
