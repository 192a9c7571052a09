use std::time::{Duration, Instant};

/// Elapsed running time measured from absolute timestamps.
///
/// Paused time is excluded by folding each running stretch into
/// `accumulated`; nothing is ever incremented per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElapsedClock {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl ElapsedClock {
    pub fn start(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(now);
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Freeze the clock and return the final elapsed time.
    pub fn stop(&mut self, now: Instant) -> Duration {
        self.pause(now);
        self.accumulated
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_while_running() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::default();
        clock.start(t0);
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::default();
        clock.start(t0);
        clock.pause(t0 + Duration::from_secs(4));
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(100)), Duration::from_secs(4));

        clock.resume(t0 + Duration::from_secs(100));
        assert_eq!(
            clock.elapsed(t0 + Duration::from_secs(102)),
            Duration::from_secs(6)
        );
        assert_eq!(clock.stop(t0 + Duration::from_secs(103)), Duration::from_secs(7));
    }

    #[test]
    fn test_double_pause_and_resume_are_harmless() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::default();
        clock.start(t0);
        clock.resume(t0 + Duration::from_secs(1));
        clock.pause(t0 + Duration::from_secs(2));
        clock.pause(t0 + Duration::from_secs(5));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(9)), Duration::from_secs(2));
    }

    #[test]
    fn test_start_resets() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::default();
        clock.start(t0);
        clock.stop(t0 + Duration::from_secs(5));
        clock.start(t0 + Duration::from_secs(10));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(11)), Duration::from_secs(1));
    }
}
