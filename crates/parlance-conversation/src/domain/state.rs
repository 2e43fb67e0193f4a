//! Turn state machine and the read-only conversation view.

use parlance_core::charm::CharmLevel;
use parlance_core::turn::{NpcProfile, TurnTranscript};

use super::live_turn::LiveTurn;

/// Where a conversation is in its turn cycle.
///
/// `Idle -> Recording -> Submitting -> Animating -> Idle`, with
/// `ErrorDisplay` reachable only from `Submitting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the player to start speaking.
    Idle,
    /// The microphone is capturing.
    Recording,
    /// The recording is with the dialogue service.
    Submitting,
    /// The NPC reply is being revealed.
    Animating,
    /// A failure message is on screen.
    ErrorDisplay {
        /// Text shown to the player.
        message: String,
    },
}

impl TurnState {
    /// Short lowercase name, used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Submitting => "submitting",
            Self::Animating => "animating",
            Self::ErrorDisplay { .. } => "showing an error",
        }
    }

    /// Whether a historical replay may start in this state.
    #[must_use]
    pub fn allows_replay(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Submitting | Self::ErrorDisplay { .. }
        )
    }
}

/// Snapshot of a conversation for rendering.
#[derive(Debug, Clone)]
pub struct ConversationView {
    /// The NPC spoken to.
    pub npc: NpcProfile,
    /// Current state.
    pub state: TurnState,
    /// The turn currently shown, animating or finalized.
    pub projection: Option<LiveTurn>,
    /// Current charm level.
    pub charm: CharmLevel,
    /// Finalized turns, oldest first.
    pub history: Vec<TurnTranscript>,
}
