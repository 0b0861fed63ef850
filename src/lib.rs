//! Bulk lifecycle reconciler for Conversations service resources.
//!
//! Enumerates every conversation of a service, closes each one (falling back
//! to zero-duration timers when a direct close is rejected), optionally
//! evicts participants and deletes the conversation, and aggregates one
//! outcome per conversation into a [`RunReport`](sweep::RunReport).

pub mod cli;
pub mod config;
pub mod conversations;
pub mod error;
pub mod reconciler;
pub mod sweep;
pub mod ui;
