//! Parlance — Conversation History Store.
//!
//! An append-only, session-scoped log of finalized turns, partitioned by
//! NPC. Entries are never mutated or removed once appended.

pub mod store;

pub use store::{HistoryError, HistoryStore};
