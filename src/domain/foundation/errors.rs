//! Domain error types.

use thiserror::Error;

/// A state transition that the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot transition from {from} to {to}")]
pub struct InvalidTransition {
    /// Debug name of the current state.
    pub from: String,
    /// Debug name of the requested state.
    pub to: String,
}

impl InvalidTransition {
    /// Creates a new invalid transition error.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
