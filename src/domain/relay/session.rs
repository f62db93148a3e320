//! Relay session state.
//!
//! One `RelaySession` exists per in-flight assistant run. It owns the
//! accumulator, the run id and the terminal flags, and is only ever mutated
//! through `&mut self` by the task that drives the relay.
//!
//! ```text
//! Active -> { Completed | Stopped | Errored }   (at most one terminal outcome)
//! any    -> disposed                           (exactly once)
//! ```

use std::time::Instant;

use crate::domain::foundation::StateMachine;

use super::MessageAccumulator;

/// Outcome of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Consuming stream events.
    Active,
    /// The run finished and the final text was written.
    Completed,
    /// The user asked to stop generation.
    Stopped,
    /// Stream processing failed.
    Errored,
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Completed) | (Self::Active, Self::Stopped) | (Self::Active, Self::Errored)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Active => vec![Self::Completed, Self::Stopped, Self::Errored],
            Self::Completed | Self::Stopped | Self::Errored => vec![],
        }
    }
}

/// Mutable state of one relay session.
#[derive(Debug, Clone)]
pub struct RelaySession {
    run_id: Option<String>,
    accumulator: MessageAccumulator,
    state: SessionState,
    disposed: bool,
}

impl RelaySession {
    /// Starts a session; the flush timer begins at `started_at`.
    pub fn new(started_at: Instant) -> Self {
        Self::with_accumulator(MessageAccumulator::new(started_at))
    }

    /// Starts a session around an existing accumulator.
    pub fn with_accumulator(accumulator: MessageAccumulator) -> Self {
        Self {
            run_id: None,
            accumulator,
            state: SessionState::Active,
            disposed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once the session left `Active` or was disposed.
    ///
    /// Every state-mutating branch of the relay checks this first.
    pub fn is_finalized(&self) -> bool {
        self.disposed || self.state != SessionState::Active
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run id assigned by the provider, if the run was acknowledged.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn set_run_id(&mut self, run_id: impl Into<String>) {
        let run_id = run_id.into();
        if !run_id.is_empty() {
            self.run_id = Some(run_id);
        }
    }

    /// Appends a delta; returns the text to flush if a flush is due.
    pub fn append(&mut self, fragment: &str, now: Instant) -> Option<String> {
        self.accumulator.append(fragment, now)
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        self.accumulator.text()
    }

    pub fn accumulator(&self) -> &MessageAccumulator {
        &self.accumulator
    }

    /// Marks the run completed. Returns false if the session was not active.
    pub fn complete(&mut self) -> bool {
        self.finish(SessionState::Completed)
    }

    /// Marks the session stopped. Returns false if the session was not active.
    pub fn stop(&mut self) -> bool {
        self.finish(SessionState::Stopped)
    }

    /// Marks the session errored. Returns false if the session was not active.
    pub fn fail(&mut self) -> bool {
        self.finish(SessionState::Errored)
    }

    /// Sets the disposed flag. Returns true only on the first call.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }

    fn finish(&mut self, target: SessionState) -> bool {
        if self.disposed {
            return false;
        }
        match self.state.transition_to(target) {
            Ok(next) => {
                self.state = next;
                true
            }
            Err(_) => false,
        }
    }
}
