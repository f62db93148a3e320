//! Domain layer containing relay logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (state machine trait, transition errors)
//! - `chat` - Chat platform vocabulary (channels, messages, inbound and outbound events)
//! - `assistant` - Assistant run stream events and tool calls
//! - `relay` - Session state and the throttled message accumulator
//! - `agent` - Agent platforms and provider-specific agent state

pub mod agent;
pub mod assistant;
pub mod chat;
pub mod foundation;
pub mod relay;
