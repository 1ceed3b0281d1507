use std::time::{Duration, Instant};

/// Fixed-cadence timer polled from the event loop.
///
/// A `Ticker` fires at most once per poll. When the loop falls behind, missed
/// ticks are dropped and the next deadline is measured from the late poll, so
/// a stalled window never replays a burst of animation steps.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next: Option<Instant>,
}

impl Ticker {
    /// Creates a stopped ticker.
    pub fn new(interval: Duration) -> Self {
        debug_assert!(!interval.is_zero());
        Self {
            interval,
            next: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.next.is_some()
    }

    /// Starts (or restarts) the ticker; the first tick is one interval from `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Next time the ticker wants to be polled, if running.
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Returns `true` when a tick is due at `now`, scheduling the following one.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        if now < next {
            return false;
        }

        let scheduled = next + self.interval;
        self.next = Some(if scheduled > now { scheduled } else { now + self.interval });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_33: Duration = Duration::from_millis(33);

    #[test]
    fn stopped_ticker_never_fires() {
        let mut t = Ticker::new(MS_33);
        let now = Instant::now();
        assert!(!t.is_active());
        assert!(!t.poll(now + Duration::from_secs(10)));
        assert_eq!(t.deadline(), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let t0 = Instant::now();
        let mut t = Ticker::new(MS_33);
        t.start(t0);

        assert!(!t.poll(t0 + Duration::from_millis(10)));
        assert!(t.poll(t0 + MS_33));
        assert!(!t.poll(t0 + Duration::from_millis(40)));
        assert!(t.poll(t0 + Duration::from_millis(66)));
    }

    #[test]
    fn late_poll_drops_missed_ticks() {
        let t0 = Instant::now();
        let mut t = Ticker::new(MS_33);
        t.start(t0);

        let late = t0 + Duration::from_millis(500);
        assert!(t.poll(late));
        assert!(!t.poll(late));
        assert_eq!(t.deadline(), Some(late + MS_33));
    }

    #[test]
    fn stop_cancels_pending_tick() {
        let t0 = Instant::now();
        let mut t = Ticker::new(MS_33);
        t.start(t0);
        t.stop();
        assert!(!t.poll(t0 + MS_33));
    }
}
