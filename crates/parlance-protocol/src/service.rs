//! The dialogue service port and its request/reply types.

use std::path::PathBuf;

use async_trait::async_trait;
use parlance_core::charm::CharmLevel;
use parlance_core::error::TurnError;
use parlance_core::turn::{NpcProfile, WordAlignment};

use crate::metadata::{TurnMetadata, into_alignments};

/// Everything sent to the dialogue service for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// The NPC being spoken to.
    pub npc: NpcProfile,
    /// Charm level before this turn.
    pub charm: CharmLevel,
    /// Prior conversation as `"Speaker: text"` lines.
    pub history_transcript: String,
    /// The player's recorded utterance.
    pub recording: PathBuf,
}

/// What the dialogue service returned for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// What the service heard the player say.
    pub player_text: String,
    /// Word alignments of the player's utterance.
    pub player_alignments: Vec<WordAlignment>,
    /// The NPC's reply in the target language.
    pub npc_text: String,
    /// English gloss of the reply.
    pub npc_english: String,
    /// Word alignments of the reply.
    pub npc_alignments: Vec<WordAlignment>,
    /// Signed charm adjustment.
    pub charm_delta: i32,
    /// Spoken reply, when the service sent audio.
    pub npc_audio: Option<PathBuf>,
}

impl TurnReply {
    /// Builds a reply from decoded metadata and the stored audio artifact.
    #[must_use]
    pub fn from_metadata(metadata: TurnMetadata, npc_audio: Option<PathBuf>) -> Self {
        Self {
            player_text: metadata.input_target,
            player_alignments: into_alignments(metadata.input_mapping),
            npc_text: metadata.response_target,
            npc_english: metadata.response_english,
            npc_alignments: into_alignments(metadata.response_mapping),
            charm_delta: metadata.charm_delta,
            npc_audio,
        }
    }
}

/// Remote dialogue service: speech in, NPC reply out.
#[async_trait]
pub trait DialogueService: Send + Sync {
    /// Submits one recorded turn.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::Transport`, `TurnError::Protocol`,
    /// `TurnError::Service` or `TurnError::Storage` classified per failure.
    async fn submit_turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError>;
}
