//! Wall-clock countdown for timed exercises
//!
//! - `countdown`: pure `TimerState` transitions (`start`, `tick`, `reset`)
//! - `scheduler`: tokio task polling the state against a `Clock`
//! - `clock`: real and hand-driven clocks

mod clock;
mod countdown;
mod scheduler;

pub use clock::{Clock, ManualClock, TokioClock};
pub use countdown::{format_countdown, Expiry, TimerState};
pub use scheduler::{CountdownTimer, TimerEvents, DEFAULT_POLL_INTERVAL};
