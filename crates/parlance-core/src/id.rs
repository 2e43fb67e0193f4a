//! Turn id generation.
//!
//! In production ids are time-ordered UUIDs. In tests a sequential
//! implementation is injected so assertions can name ids up front.

use uuid::Uuid;

use crate::turn::TurnId;

/// Abstraction over turn id generation.
pub trait TurnIdSource: Send + Sync {
    /// Returns a fresh, never-before-issued turn id.
    fn next_id(&self) -> TurnId;
}

/// Production id source issuing UUID v7 values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOrderedIds;

impl TurnIdSource for TimeOrderedIds {
    fn next_id(&self) -> TurnId {
        TurnId(Uuid::now_v7())
    }
}
