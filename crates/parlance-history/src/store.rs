//! In-memory history store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use parlance_core::turn::{NpcId, TurnId, TurnTranscript};
use thiserror::Error;

/// History store errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The turn id is already present in this NPC's history.
    #[error("turn {turn_id} already recorded for {npc_id}")]
    DuplicateTurn {
        /// The NPC whose history was targeted.
        npc_id: NpcId,
        /// The repeated turn id.
        turn_id: TurnId,
    },
}

/// Ordered turns exchanged with one NPC.
#[derive(Debug, Default)]
struct ConversationHistory {
    turns: Vec<TurnTranscript>,
}

impl ConversationHistory {
    fn turns(&self) -> &[TurnTranscript] {
        &self.turns
    }

    fn last(&self) -> Option<&TurnTranscript> {
        self.turns.last()
    }

    fn len(&self) -> usize {
        self.turns.len()
    }

    fn get(&self, turn_id: TurnId) -> Option<&TurnTranscript> {
        self.turns.iter().find(|turn| turn.id == turn_id)
    }

    /// Newline-joined `"Speaker: text"` lines.
    fn flattened(&self) -> String {
        self.turns
            .iter()
            .map(TurnTranscript::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, npc_id: &NpcId, turn: TurnTranscript) -> Result<(), HistoryError> {
        if self.get(turn.id).is_some() {
            return Err(HistoryError::DuplicateTurn {
                npc_id: npc_id.clone(),
                turn_id: turn.id,
            });
        }
        self.turns.push(turn);
        Ok(())
    }
}

/// Session-wide history, one partition per NPC created on first append.
///
/// Each conversation is the single writer of its own partition; readers get
/// snapshots.
#[derive(Debug, Default)]
pub struct HistoryStore {
    partitions: RwLock<HashMap<NpcId, ConversationHistory>>,
}

impl HistoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finalized turn to `npc_id`'s history.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::DuplicateTurn` if the id is already recorded.
    pub fn append(&self, npc_id: &NpcId, turn: TurnTranscript) -> Result<(), HistoryError> {
        let turn_id = turn.id;
        let mut partitions = self
            .partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let history = partitions.entry(npc_id.clone()).or_default();
        history.push(npc_id, turn)?;
        tracing::debug!(npc_id = %npc_id, turn_id = %turn_id, len = history.len(), "turn appended");
        Ok(())
    }

    /// Returns a snapshot of every turn recorded for `npc_id`.
    #[must_use]
    pub fn all(&self, npc_id: &NpcId) -> Vec<TurnTranscript> {
        self.read(npc_id, |history| history.turns().to_vec())
            .unwrap_or_default()
    }

    /// Returns the most recent turn recorded for `npc_id`.
    #[must_use]
    pub fn last(&self, npc_id: &NpcId) -> Option<TurnTranscript> {
        self.read(npc_id, |history| history.last().cloned())
            .flatten()
    }

    /// Looks up a turn of `npc_id` by id.
    #[must_use]
    pub fn get(&self, npc_id: &NpcId, turn_id: TurnId) -> Option<TurnTranscript> {
        self.read(npc_id, |history| history.get(turn_id).cloned())
            .flatten()
    }

    /// Number of turns recorded for `npc_id`.
    #[must_use]
    pub fn len(&self, npc_id: &NpcId) -> usize {
        self.read(npc_id, ConversationHistory::len).unwrap_or(0)
    }

    /// Flattened `"Speaker: text"` transcript of `npc_id`'s history.
    #[must_use]
    pub fn flattened_transcript(&self, npc_id: &NpcId) -> String {
        self.read(npc_id, ConversationHistory::flattened)
            .unwrap_or_default()
    }

    fn read<T>(&self, npc_id: &NpcId, f: impl FnOnce(&ConversationHistory) -> T) -> Option<T> {
        let partitions = self
            .partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        partitions.get(npc_id).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlance_test_support::{npc_turn, player_turn};

    #[test]
    fn test_partition_is_created_on_first_append() {
        // Arrange
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");
        assert_eq!(store.len(&baker), 0);
        assert!(store.last(&baker).is_none());

        // Act
        store.append(&baker, player_turn(1, "안녕하세요")).unwrap();

        // Assert
        assert_eq!(store.len(&baker), 1);
        assert_eq!(store.last(&baker).unwrap().raw_text, "안녕하세요");
    }

    #[test]
    fn test_partitions_are_independent() {
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");
        let guard = NpcId::new("guard");

        store.append(&baker, player_turn(1, "빵 주세요")).unwrap();

        assert_eq!(store.len(&baker), 1);
        assert!(store.all(&guard).is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        // Arrange
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");

        // Act
        store.append(&baker, player_turn(1, "하나")).unwrap();
        store.append(&baker, npc_turn(2, "Baker", "둘")).unwrap();
        store.append(&baker, player_turn(3, "셋")).unwrap();

        // Assert
        let texts: Vec<_> = store
            .all(&baker)
            .into_iter()
            .map(|turn| turn.raw_text)
            .collect();
        assert_eq!(texts, ["하나", "둘", "셋"]);
    }

    #[test]
    fn test_duplicate_turn_id_is_rejected() {
        // Arrange
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");
        let first = player_turn(1, "하나");
        let turn_id = first.id;
        store.append(&baker, first).unwrap();

        // Act
        let result = store.append(&baker, player_turn(1, "다시"));

        // Assert
        assert_eq!(
            result,
            Err(HistoryError::DuplicateTurn {
                npc_id: baker.clone(),
                turn_id,
            })
        );
        assert_eq!(store.len(&baker), 1);
        assert_eq!(store.last(&baker).unwrap().raw_text, "하나");
    }

    #[test]
    fn test_flattened_transcript_renders_speaker_lines() {
        // Arrange
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");
        store.append(&baker, player_turn(1, "빵 주세요")).unwrap();
        store.append(&baker, npc_turn(2, "Baker", "여기 있어요")).unwrap();

        // Act
        let transcript = store.flattened_transcript(&baker);

        // Assert
        assert_eq!(transcript, "Player: 빵 주세요\nBaker: 여기 있어요");
    }

    #[test]
    fn test_flattened_transcript_is_empty_for_unknown_npc() {
        let store = HistoryStore::new();

        assert_eq!(store.flattened_transcript(&NpcId::new("nobody")), "");
    }

    #[test]
    fn test_get_finds_turn_by_id() {
        let store = HistoryStore::new();
        let baker = NpcId::new("baker");
        let turn = npc_turn(9, "Baker", "어서 오세요");
        let turn_id = turn.id;
        store.append(&baker, turn).unwrap();

        let found = store.get(&baker, turn_id).unwrap();

        assert_eq!(found.raw_text, "어서 오세요");
    }
}
