//! The turn currently on screen.

use parlance_core::turn::{TurnId, TurnTranscript};

/// The single "currently shown" turn of a conversation.
///
/// An NPC reply starts as an empty placeholder whose text grows as the
/// reveal advances, then is finalized in place. Its id never changes, so
/// the entry later appended to history carries the id the renderer has
/// been showing all along. A turn restored from history starts finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTurn {
    shown: TurnTranscript,
    full_text: String,
    finalized: bool,
}

impl LiveTurn {
    /// Starts animating `turn`; nothing of its text is visible yet.
    #[must_use]
    pub fn animating(mut turn: TurnTranscript) -> Self {
        let full_text = std::mem::take(&mut turn.raw_text);
        Self {
            shown: turn,
            full_text,
            finalized: false,
        }
    }

    /// Shows a turn that is already in history.
    #[must_use]
    pub fn restored(turn: TurnTranscript) -> Self {
        Self {
            full_text: turn.raw_text.clone(),
            shown: turn,
            finalized: true,
        }
    }

    /// The turn's stable id.
    #[must_use]
    pub fn id(&self) -> TurnId {
        self.shown.id
    }

    /// The turn as it should be rendered right now.
    #[must_use]
    pub fn turn(&self) -> &TurnTranscript {
        &self.shown
    }

    /// Text visible so far.
    #[must_use]
    pub fn visible_text(&self) -> &str {
        &self.shown.raw_text
    }

    /// Whether the turn has been committed.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Updates the visible prefix. Ignored once finalized or when `prefix`
    /// is not a prefix of the turn's text.
    pub fn show_prefix(&mut self, prefix: &str) {
        if !self.finalized && self.full_text.starts_with(prefix) {
            prefix.clone_into(&mut self.shown.raw_text);
        }
    }

    /// Reveals the full text and freezes the turn, returning the entry to
    /// commit to history. Returns `None` if it was already finalized.
    pub fn finalize(&mut self) -> Option<TurnTranscript> {
        if self.finalized {
            return None;
        }
        self.finalized = true;
        self.shown.raw_text.clone_from(&self.full_text);
        Some(self.shown.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlance_test_support::npc_turn;

    #[test]
    fn test_placeholder_starts_empty_and_keeps_its_id() {
        // Arrange
        let turn = npc_turn(2, "Baker", "어서 오세요");

        // Act
        let mut live = LiveTurn::animating(turn.clone());
        let empty = live.visible_text().to_owned();
        live.show_prefix("어서");
        let partial = live.visible_text().to_owned();
        let committed = live.finalize();

        // Assert
        assert_eq!(empty, "");
        assert_eq!(partial, "어서");
        assert_eq!(committed, Some(turn.clone()));
        assert_eq!(live.id(), turn.id);
        assert!(live.is_finalized());
    }

    #[test]
    fn test_finalize_happens_once() {
        let mut live = LiveTurn::animating(npc_turn(2, "Baker", "네"));

        assert!(live.finalize().is_some());
        assert!(live.finalize().is_none());
    }

    #[test]
    fn test_finalized_turn_ignores_progress() {
        let mut live = LiveTurn::restored(npc_turn(4, "Baker", "감사합니다"));

        live.show_prefix("감");

        assert_eq!(live.visible_text(), "감사합니다");
    }
}
