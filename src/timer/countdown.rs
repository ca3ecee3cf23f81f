use std::time::Duration;
use tokio::time::Instant;

/// Emitted exactly once when a running countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// Instant at which the expiry was observed
    pub at: Instant,

    /// How far past the deadline the observing poll landed
    pub overrun: Duration,
}

/// Countdown state
///
/// All transitions are pure: they take the current instant and return the
/// next state. `remaining` is recomputed from the anchor on every tick, so a
/// late or skipped poll never makes the displayed time drift from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    total: Duration,
    anchor: Option<Instant>,
    running: bool,
    remaining: Duration,
}

impl TimerState {
    /// A countdown that has not been started yet
    pub fn idle(total: Duration) -> Self {
        Self {
            total,
            anchor: None,
            running: false,
            remaining: total,
        }
    }

    /// Anchor the countdown at `now`
    ///
    /// Starting an already running countdown discards the previous anchor.
    pub fn start(self, now: Instant) -> Self {
        Self {
            total: self.total,
            anchor: Some(now),
            running: true,
            remaining: self.total,
        }
    }

    /// Recompute `remaining` at `now`
    ///
    /// Returns the expiry on the tick that first observes zero; the returned
    /// state is no longer running, so later ticks are no-ops.
    pub fn tick(self, now: Instant) -> (Self, Option<Expiry>) {
        let anchor = match (self.running, self.anchor) {
            (true, Some(anchor)) => anchor,
            _ => return (self, None),
        };

        let elapsed = now.saturating_duration_since(anchor);
        let remaining = self.total.saturating_sub(elapsed).min(self.remaining);

        if remaining.is_zero() {
            let next = Self {
                running: false,
                remaining: Duration::ZERO,
                ..self
            };
            let expiry = Expiry {
                at: now,
                overrun: elapsed.saturating_sub(self.total),
            };
            return (next, Some(expiry));
        }

        (Self { remaining, ..self }, None)
    }

    /// Stop without expiring and restore the full duration
    pub fn reset(self) -> Self {
        Self::idle(self.total)
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.anchor.is_some() && !self.running && self.remaining.is_zero()
    }

    /// Fraction of the window already used, 0.0..=1.0 (drives progress rings)
    pub fn progress(&self) -> f64 {
        if self.total.is_zero() {
            return 1.0;
        }
        let used = self.total - self.remaining;
        used.as_secs_f64() / self.total.as_secs_f64()
    }
}

/// Render a duration as `m:ss`, rounding partial seconds up
///
/// A countdown showing 9.2s left reads `0:10`, and hits `0:00` only at zero.
pub fn format_countdown(duration: Duration) -> String {
    let millis = duration.as_millis();
    let total_secs = millis.div_ceil(1000);
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_idle_state_does_not_tick() {
        let state = TimerState::idle(secs(10.0));
        let (next, expiry) = state.tick(Instant::now());

        assert_eq!(next, state);
        assert!(expiry.is_none());
        assert!(!next.is_running());
        assert_eq!(next.remaining(), secs(10.0));
    }

    #[test]
    fn test_tick_derives_remaining_from_anchor() {
        let t0 = Instant::now();
        let state = TimerState::idle(secs(10.0)).start(t0);

        let (state, expiry) = state.tick(t0 + secs(3.5));
        assert!(expiry.is_none());
        assert_eq!(state.remaining(), secs(6.5));

        // A skipped poll does not matter: the next tick catches up
        let (state, expiry) = state.tick(t0 + secs(9.0));
        assert!(expiry.is_none());
        assert_eq!(state.remaining(), secs(1.0));
    }

    #[test]
    fn test_expiry_fires_once() {
        let t0 = Instant::now();
        let state = TimerState::idle(secs(5.0)).start(t0);

        let (state, expiry) = state.tick(t0 + secs(5.2));
        let expiry = expiry.expect("should expire");
        assert_eq!(expiry.overrun, secs(0.2));
        assert!(state.is_expired());
        assert_eq!(state.remaining(), Duration::ZERO);

        let (state, again) = state.tick(t0 + secs(6.0));
        assert!(again.is_none());
        assert!(state.is_expired());
    }

    #[test]
    fn test_restart_replaces_anchor() {
        let t0 = Instant::now();
        let state = TimerState::idle(secs(10.0)).start(t0);
        let (state, _) = state.tick(t0 + secs(4.0));

        let restarted = state.start(t0 + secs(4.0));
        let (restarted, _) = restarted.tick(t0 + secs(5.0));
        assert_eq!(restarted.remaining(), secs(9.0));
    }

    #[test]
    fn test_reset_stops_without_expiry() {
        let t0 = Instant::now();
        let state = TimerState::idle(secs(10.0)).start(t0).reset();

        assert!(!state.is_running());
        assert!(!state.is_expired());
        let (_, expiry) = state.tick(t0 + secs(20.0));
        assert!(expiry.is_none());
    }

    #[test]
    fn test_progress() {
        let t0 = Instant::now();
        let state = TimerState::idle(secs(10.0)).start(t0);
        let (state, _) = state.tick(t0 + secs(2.5));

        assert!((state.progress() - 0.25).abs() < 1e-9);
        assert_eq!(TimerState::idle(Duration::ZERO).progress(), 1.0);
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(secs(10.0)), "0:10");
        assert_eq!(format_countdown(secs(9.2)), "0:10");
        assert_eq!(format_countdown(secs(0.05)), "0:01");
        assert_eq!(format_countdown(Duration::ZERO), "0:00");
        assert_eq!(format_countdown(secs(59.5)), "1:00");
        assert_eq!(format_countdown(secs(125.0)), "2:05");
    }
}
