use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clock::{Clock, TokioClock};
use super::countdown::{Expiry, TimerState};

/// Default polling period (not aligned to second boundaries)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Receivers handed out by [`CountdownTimer::start`]
#[derive(Debug)]
pub struct TimerEvents {
    /// Latest countdown state, updated on every poll
    pub state: watch::Receiver<TimerState>,

    /// Resolves once when the countdown expires; errors if the timer was
    /// reset or restarted first
    pub expiry: oneshot::Receiver<Expiry>,
}

impl TimerEvents {
    /// Current remaining time
    pub fn remaining(&self) -> Duration {
        self.state.borrow().remaining()
    }
}

/// Drives [`TimerState::tick`] from a tokio interval
pub struct CountdownTimer {
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn new(clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            clock,
            poll_interval,
            task: None,
        }
    }

    /// Begin counting down `duration` from now
    ///
    /// A countdown that is still running is discarded (last start wins).
    pub fn start(&mut self, duration: Duration) -> TimerEvents {
        if let Some(previous) = self.task.take() {
            if !previous.is_finished() {
                debug!("Countdown restarted while running; discarding previous anchor");
            }
            previous.abort();
        }

        let state = TimerState::idle(duration).start(self.clock.now());
        let (state_tx, state_rx) = watch::channel(state);
        let (expiry_tx, expiry_rx) = oneshot::channel();

        let clock = Arc::clone(&self.clock);
        let poll_interval = self.poll_interval;

        info!("Countdown started: {:.1}s", duration.as_secs_f64());

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut state = state;

            loop {
                interval.tick().await;

                let (next, expiry) = state.tick(clock.now());
                state = next;
                state_tx.send_replace(state);

                if let Some(expiry) = expiry {
                    debug!("Countdown expired (overrun {:?})", expiry.overrun);
                    // Receiver may already be gone if the flow was abandoned
                    let _ = expiry_tx.send(expiry);
                    break;
                }
            }
        }));

        TimerEvents {
            state: state_rx,
            expiry: expiry_rx,
        }
    }

    /// Cancel any pending poll; the outstanding expiry receiver errors out
    pub fn reset(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Countdown reset");
            task.abort();
        }
    }

    /// Whether a poll task is still counting down
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(Arc::new(TokioClock), DEFAULT_POLL_INTERVAL)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.reset();
    }
}
