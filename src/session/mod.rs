//! Participant session
//!
//! - `SessionContext`: the explicit identity passed to every wizard step
//! - `SessionStore`: JSON file that remembers the user between runs

mod context;
mod store;

pub use context::{SessionContext, SessionError, UserId};
pub use store::SessionStore;
