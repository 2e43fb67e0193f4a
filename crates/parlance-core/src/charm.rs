//! Bounded relationship score between the player and one NPC.

use serde::{Deserialize, Serialize};

/// Charm level, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct CharmLevel(u8);

impl CharmLevel {
    /// Lowest charm level.
    pub const MIN: Self = Self(0);
    /// Highest charm level.
    pub const MAX: Self = Self(100);

    /// Creates a charm level, clamping `value` into `[0, 100]`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamped(value: i64) -> Self {
        // The clamp keeps the value within u8 range.
        Self(value.clamp(0, i64::from(Self::MAX.0)) as u8)
    }

    /// Returns the numeric level.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns `true` when the level is at the maximum.
    #[must_use]
    pub fn is_max(self) -> bool {
        self == Self::MAX
    }

    /// Applies a signed delta with clamping and reports the transition.
    #[must_use]
    pub fn apply(self, delta: i32) -> CharmChange {
        let after = Self::clamped(i64::from(self.0) + i64::from(delta));
        CharmChange {
            before: self,
            after,
            delta,
        }
    }
}

impl TryFrom<i64> for CharmLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Self::clamped(value))
        } else {
            Err(format!("charm level {value} outside [0, 100]"))
        }
    }
}

impl From<CharmLevel> for u8 {
    fn from(level: CharmLevel) -> Self {
        level.0
    }
}

/// Result of applying a delta to a `CharmLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharmChange {
    /// Level before the delta.
    pub before: CharmLevel,
    /// Level after the clamped delta.
    pub after: CharmLevel,
    /// The requested delta.
    pub delta: i32,
}

impl CharmChange {
    /// Edge trigger: `true` only when this change crossed from below the
    /// maximum to exactly the maximum.
    #[must_use]
    pub fn reached_max(&self) -> bool {
        !self.before.is_max() && self.after.is_max()
    }

    /// Returns `true` when the level actually moved.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}
