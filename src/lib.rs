//! nudge - deterministic next-action resolver for delivery work
//!
//! Aggregates repository and code-host facts into one snapshot, runs a
//! strictly-ordered priority cascade over them, and recommends exactly one
//! next action - or defers the choice to the caller through a stateless
//! decision protocol. The only cross-invocation state is a small persisted
//! record of required enforcement actions and their policies.

pub mod branch;
pub mod checklist;
pub mod config;
pub mod decision;
pub mod error;
pub mod provider;
pub mod readiness;
pub mod resolve;
pub mod snapshot;
pub mod state;
pub mod types;

pub use error::{Error, Result};
