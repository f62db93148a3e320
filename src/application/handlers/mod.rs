//! Application handlers.
//!
//! Orchestrate domain state against the ports for one unit of work.

pub mod response_relay;

pub use response_relay::{DisposeCallback, RelayError, ResponseRelay};
