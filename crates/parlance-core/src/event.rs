//! Signals emitted to collaborators outside the conversation core.

use tokio::sync::mpsc;

use crate::charm::CharmLevel;
use crate::turn::{NpcId, TurnId, TurnTranscript};

/// Events published by a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// A turn was appended to history; consumed by the sync subsystem.
    TurnFinalized {
        /// The NPC whose history received the turn.
        npc_id: NpcId,
        /// The finalized turn.
        turn: TurnTranscript,
    },
    /// The charm level moved.
    CharmChanged {
        /// The NPC the charm belongs to.
        npc_id: NpcId,
        /// Level before the turn.
        before: CharmLevel,
        /// Level after the turn.
        after: CharmLevel,
    },
    /// Charm crossed from below the maximum to the maximum.
    MaxCharmReached {
        /// The NPC whose charm maxed out.
        npc_id: NpcId,
    },
    /// A full exchange (player line plus NPC reply) was committed.
    TurnCompleted {
        /// The NPC spoken to.
        npc_id: NpcId,
        /// The player's turn.
        player_turn: TurnId,
        /// The NPC's reply turn.
        npc_turn: TurnId,
    },
}

impl ConversationEvent {
    /// Returns the event type name (used for logging).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnFinalized { .. } => "conversation.turn_finalized",
            Self::CharmChanged { .. } => "conversation.charm_changed",
            Self::MaxCharmReached { .. } => "conversation.max_charm_reached",
            Self::TurnCompleted { .. } => "conversation.turn_completed",
        }
    }

    /// Returns the NPC the event concerns.
    #[must_use]
    pub fn npc_id(&self) -> &NpcId {
        match self {
            Self::TurnFinalized { npc_id, .. }
            | Self::CharmChanged { npc_id, .. }
            | Self::MaxCharmReached { npc_id }
            | Self::TurnCompleted { npc_id, .. } => npc_id,
        }
    }
}

/// Sink for conversation events. Implementations must not block.
pub trait EventPublisher: Send + Sync {
    /// Hands `event` to subscribers.
    fn publish(&self, event: ConversationEvent);
}

/// Publisher forwarding events over an unbounded tokio channel, so
/// subscribers consume them on their own task.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<ConversationEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiving end subscribers read from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConversationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: ConversationEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            tracing::debug!(event_type, "event dropped, no subscriber");
        }
    }
}
