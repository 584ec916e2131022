//! Feature Sieve server: configuration, OpenAI-compatible collaborators and the
//! HTTP surface around the `sieve-core` engine.

pub mod ai;
pub mod api;
pub mod config;

pub use sieve_core;
