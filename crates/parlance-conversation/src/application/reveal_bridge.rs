//! Routes reveal callbacks back into the conversation that started them.

use std::sync::Weak;

use parlance_core::turn::TurnId;
use parlance_reveal::RevealSink;

use super::orchestrator::Shared;

/// Sink for one reveal. Holds the conversation weakly and names the turn
/// being revealed, so callbacks from a superseded or torn-down reveal fall
/// through without effect.
pub(super) struct RevealBridge {
    shared: Weak<Shared>,
    npc_turn: TurnId,
}

impl RevealBridge {
    pub(super) fn new(shared: Weak<Shared>, npc_turn: TurnId) -> Self {
        Self { shared, npc_turn }
    }
}

impl RevealSink for RevealBridge {
    fn on_progress(&self, revealed: &str) {
        if let Some(shared) = self.shared.upgrade() {
            shared.show_progress(self.npc_turn, revealed);
        }
    }

    fn on_complete(&self, _text: &str) {
        if let Some(shared) = self.shared.upgrade() {
            shared.complete_reveal(self.npc_turn);
        }
    }
}
