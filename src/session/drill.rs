use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::session::{Counters, Mode, PracticeContext, SessionStatus};
use crate::store::stats::{ModeEvent, StatsStore};

/// How long a hit stays on screen before the next target replaces it.
pub const NEXT_TARGET_DELAY: Duration = Duration::from_millis(200);

/// Outcome of the latest keystroke, for the feedback line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrillFeedback {
    Hit {
        key: Option<String>,
        got: char,
    },
    Miss {
        key: Option<String>,
        got: char,
        expected: char,
    },
}

/// Single-kana drill: show one target, judge one keystroke.
pub struct DrillSession {
    status: SessionStatus,
    target: Option<char>,
    target_key: Option<String>,
    counters: Counters,
    advance_at: Option<Instant>,
    repick_on_resume: bool,
    feedback: Option<DrillFeedback>,
    rng: SmallRng,
}

impl Default for DrillSession {
    fn default() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl DrillSession {
    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            status: SessionStatus::Idle,
            target: None,
            target_key: None,
            counters: Counters::default(),
            advance_at: None,
            repick_on_resume: false,
            feedback: None,
            rng,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn target(&self) -> Option<char> {
        self.target
    }

    /// The physical key trained for the current target, if the map has one.
    pub fn target_key(&self) -> Option<&str> {
        self.target_key.as_deref()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn feedback(&self) -> Option<&DrillFeedback> {
        self.feedback.as_ref()
    }

    /// Whether a hit is still being shown and input is on hold.
    pub fn is_advancing(&self) -> bool {
        self.advance_at.is_some()
    }

    pub fn start(&mut self, ctx: &PracticeContext) {
        match self.status {
            SessionStatus::Running => return,
            SessionStatus::Paused => {
                self.resume(ctx);
                return;
            }
            SessionStatus::Idle => {}
        }
        self.counters = Counters::default();
        self.advance_at = None;
        self.repick_on_resume = false;
        self.status = SessionStatus::Running;
        self.pick_target(ctx);
        tracing::info!(mapped = ctx.is_mapped(), "drill started");
    }

    pub fn pause(&mut self) {
        if self.status != SessionStatus::Running {
            return;
        }
        if self.advance_at.take().is_some() {
            self.repick_on_resume = true;
        }
        self.status = SessionStatus::Paused;
    }

    pub fn resume(&mut self, ctx: &PracticeContext) {
        if self.status != SessionStatus::Paused {
            return;
        }
        self.status = SessionStatus::Running;
        if std::mem::take(&mut self.repick_on_resume) {
            self.pick_target(ctx);
        }
    }

    pub fn stop(&mut self) {
        if self.status == SessionStatus::Idle {
            return;
        }
        self.status = SessionStatus::Idle;
        self.target = None;
        self.target_key = None;
        self.advance_at = None;
        self.repick_on_resume = false;
        self.feedback = None;
        tracing::info!(
            correct = self.counters.correct,
            wrong = self.counters.wrong,
            best_streak = self.counters.best_streak,
            "drill stopped"
        );
    }

    /// Judge one keystroke. `key` is the physical key in mapped mode; in
    /// mapped mode the key itself must match the trained key, otherwise the
    /// kana must match. Returns whether it was a hit, or `None` if ignored.
    ///
    /// Keystrokes while a hit is still shown are not judged: the shown kana
    /// was already answered and the next one is not on screen yet.
    pub fn submit(
        &mut self,
        ctx: &PracticeContext,
        stats: &mut StatsStore,
        key: Option<&str>,
        got: char,
        now: Instant,
    ) -> Option<bool> {
        if self.status != SessionStatus::Running {
            return None;
        }
        if self.advance_at.is_some() {
            tracing::debug!(%got, "keystroke during hit hold not judged");
            return None;
        }
        let Some(target) = self.target else {
            self.pick_target(ctx);
            return None;
        };
        let hit = if ctx.is_mapped() {
            let Some(target_key) = self.target_key.as_deref() else {
                self.pick_target(ctx);
                return None;
            };
            key == Some(target_key)
        } else {
            got == target
        };

        let key = key.map(str::to_string);
        if hit {
            self.counters.correct += 1;
            self.counters.streak += 1;
            self.counters.best_streak = self.counters.best_streak.max(self.counters.streak);
            stats.record_correct(target);
            stats.record_mode_event(Mode::Drill, ModeEvent::Correct);
            stats.record_mode_event(Mode::Drill, ModeEvent::Streak(self.counters.streak));
            self.feedback = Some(DrillFeedback::Hit { key, got });
            self.advance_at = Some(now + NEXT_TARGET_DELAY);
        } else {
            self.counters.wrong += 1;
            self.counters.streak = 0;
            stats.record_wrong(target);
            stats.record_mode_event(Mode::Drill, ModeEvent::Wrong);
            self.feedback = Some(DrillFeedback::Miss {
                key,
                got,
                expected: target,
            });
        }
        tracing::debug!(%target, %got, hit, "drill keystroke");
        Some(hit)
    }

    /// Show the next target once the hit delay has passed.
    pub fn tick(&mut self, ctx: &PracticeContext, now: Instant) {
        if self.status != SessionStatus::Running {
            return;
        }
        if let Some(at) = self.advance_at
            && now >= at
        {
            self.advance_at = None;
            self.pick_target(ctx);
        }
    }

    fn pick_target(&mut self, ctx: &PracticeContext) {
        let pool = ctx.pool();
        self.target = pool.choose(&mut self.rng).copied();
        self.target_key = self
            .target
            .and_then(|ch| ctx.keymap.key_for(ch))
            .map(str::to_string);
        self.feedback = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, InputMode};
    use crate::generator::lists::BuiltinLists;
    use crate::keyboard::keymap::{KeyMap, LayoutName};
    use crate::store::kv::MemoryStore;

    struct Fixture {
        config: Config,
        keymap: KeyMap,
        lists: BuiltinLists,
    }

    impl Fixture {
        fn new(mode: InputMode) -> Self {
            Self {
                config: Config {
                    input_mode: mode,
                    ..Config::default()
                },
                keymap: KeyMap::for_layout(LayoutName::Jis),
                lists: BuiltinLists::load(),
            }
        }

        fn ctx(&self) -> PracticeContext<'_> {
            PracticeContext {
                config: &self.config,
                keymap: &self.keymap,
                word_sets: &[],
                lists: &self.lists,
            }
        }
    }

    fn drill() -> DrillSession {
        DrillSession::with_rng(SmallRng::seed_from_u64(1))
    }

    fn stats() -> StatsStore {
        StatsStore::new(Box::new(MemoryStore::new()))
    }

    fn wrong_kana(target: char) -> char {
        if target == 'ね' { 'こ' } else { 'ね' }
    }

    #[test]
    fn test_start_picks_target_from_pool() {
        let fx = Fixture::new(InputMode::Native);
        let mut drill = drill();
        drill.start(&fx.ctx());
        assert_eq!(drill.status(), SessionStatus::Running);
        let target = drill.target().unwrap();
        assert!(fx.ctx().pool().contains(&target));
    }

    #[test]
    fn test_hit_schedules_next_target() {
        let fx = Fixture::new(InputMode::Native);
        let mut stats = stats();
        let mut drill = drill();
        let t0 = Instant::now();
        drill.start(&fx.ctx());
        let target = drill.target().unwrap();

        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, target, t0), Some(true));
        assert!(drill.is_advancing());
        // Input is held while the hit is shown.
        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, target, t0), None);

        drill.tick(&fx.ctx(), t0 + Duration::from_millis(100));
        assert!(drill.is_advancing());
        drill.tick(&fx.ctx(), t0 + NEXT_TARGET_DELAY);
        assert!(!drill.is_advancing());
        assert!(drill.feedback().is_none());

        let counters = drill.counters();
        assert_eq!((counters.correct, counters.streak, counters.best_streak), (1, 1, 1));
        assert_eq!(stats.snapshot().practice.correct, 1);
        assert_eq!(stats.snapshot().practice.best_streak, 1);
        assert_eq!(stats.snapshot().kana_stat(target).correct, 1);
    }

    #[test]
    fn test_keystroke_during_hold_is_not_counted() {
        let fx = Fixture::new(InputMode::Native);
        let mut stats = stats();
        let mut drill = drill();
        let t0 = Instant::now();
        drill.start(&fx.ctx());
        let target = drill.target().unwrap();
        drill.submit(&fx.ctx(), &mut stats, None, target, t0);

        let later = t0 + Duration::from_millis(50);
        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, wrong_kana(target), later), None);
        assert_eq!(drill.target(), Some(target));
        assert!(matches!(drill.feedback(), Some(DrillFeedback::Hit { .. })));
        let counters = drill.counters();
        assert_eq!((counters.correct, counters.wrong, counters.streak), (1, 0, 1));
        assert_eq!(stats.snapshot().practice.wrong, 0);

        drill.tick(&fx.ctx(), t0 + NEXT_TARGET_DELAY);
        let next = drill.target().unwrap();
        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, next, t0 + NEXT_TARGET_DELAY), Some(true));
        assert_eq!(drill.counters().streak, 2);
    }

    #[test]
    fn test_miss_resets_streak() {
        let fx = Fixture::new(InputMode::Native);
        let mut stats = stats();
        let mut drill = drill();
        let t0 = Instant::now();
        drill.start(&fx.ctx());
        let target = drill.target().unwrap();
        drill.submit(&fx.ctx(), &mut stats, None, target, t0);
        drill.tick(&fx.ctx(), t0 + NEXT_TARGET_DELAY);

        let target = drill.target().unwrap();
        let got = wrong_kana(target);
        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, got, t0), Some(false));
        assert_eq!(drill.counters().streak, 0);
        assert_eq!(drill.counters().best_streak, 1);
        assert_eq!(drill.target(), Some(target));
        assert_eq!(
            drill.feedback(),
            Some(&DrillFeedback::Miss {
                key: None,
                got,
                expected: target
            })
        );
        assert_eq!(stats.snapshot().kana_stat(target).wrong, 1);
        assert_eq!(stats.snapshot().practice.wrong, 1);
    }

    #[test]
    fn test_mapped_mode_judges_the_physical_key() {
        let fx = Fixture::new(InputMode::Mapped);
        let mut stats = stats();
        let mut drill = drill();
        let t0 = Instant::now();
        drill.start(&fx.ctx());
        let target = drill.target().unwrap();
        let key = drill.target_key().unwrap().to_string();
        assert_eq!(fx.keymap.resolve(&key), Some(target));

        // Right kana from the wrong key is still a miss.
        assert_eq!(
            drill.submit(&fx.ctx(), &mut stats, Some("Unmapped"), target, t0),
            Some(false)
        );
        assert_eq!(
            drill.submit(&fx.ctx(), &mut stats, Some(&key), target, t0),
            Some(true)
        );
    }

    #[test]
    fn test_pause_cancels_pending_advance() {
        let fx = Fixture::new(InputMode::Native);
        let mut stats = stats();
        let mut drill = drill();
        let t0 = Instant::now();
        drill.start(&fx.ctx());
        let target = drill.target().unwrap();
        drill.submit(&fx.ctx(), &mut stats, None, target, t0);

        drill.pause();
        assert!(!drill.is_advancing());
        drill.tick(&fx.ctx(), t0 + Duration::from_secs(1));
        assert_eq!(drill.status(), SessionStatus::Paused);
        assert_eq!(drill.submit(&fx.ctx(), &mut stats, None, target, t0), None);

        drill.start(&fx.ctx());
        assert_eq!(drill.status(), SessionStatus::Running);
        assert!(drill.feedback().is_none());
        // Counters survive a pause.
        assert_eq!(drill.counters().correct, 1);
    }

    #[test]
    fn test_stop_and_redundant_calls() {
        let fx = Fixture::new(InputMode::Native);
        let mut drill = drill();
        drill.pause();
        drill.resume(&fx.ctx());
        drill.stop();
        assert_eq!(drill.status(), SessionStatus::Idle);

        drill.start(&fx.ctx());
        drill.start(&fx.ctx());
        assert_eq!(drill.status(), SessionStatus::Running);
        drill.stop();
        assert_eq!(drill.status(), SessionStatus::Idle);
        assert!(drill.target().is_none());
    }
}
