//! Stream Chat Backend - AI response relay for chat channels
//!
//! This crate streams OpenAI Assistants runs into Stream Chat messages,
//! answering tool calls with Tavily web search and honouring user stop
//! requests delivered through chat webhooks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
