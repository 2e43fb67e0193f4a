//! Test id sources — deterministic `TurnIdSource` implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use parlance_core::id::TurnIdSource;
use parlance_core::turn::TurnId;
use uuid::Uuid;

/// Issues `00000000-…-000000000001`, `…-000000000002`, and so on, so tests
/// can predict turn ids.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Starts the sequence at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Starts the sequence at `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnIdSource for SequentialIds {
    fn next_id(&self) -> TurnId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        TurnId(Uuid::from_u128(u128::from(n)))
    }
}

/// The id `SequentialIds` issues as its `n`-th value when started at 1.
#[must_use]
pub fn turn_id(n: u64) -> TurnId {
    TurnId(Uuid::from_u128(u128::from(n)))
}
