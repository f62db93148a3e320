//! Relay session domain.
//!
//! - `MessageAccumulator` - growing reply text with a 1s flush cadence
//! - `RelaySession` - per-run state machine owned by a single relay task

mod accumulator;
mod session;

pub use accumulator::{MessageAccumulator, FLUSH_INTERVAL};
pub use session::{RelaySession, SessionState};
