//! Turn and word-alignment value types.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a single turn.
///
/// Assigned once at turn creation and kept across the placeholder,
/// animating and finalized stages of an NPC reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub Uuid);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(String);

impl NpcId {
    /// Creates an NPC identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The NPC a conversation is held with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcProfile {
    /// The NPC identifier.
    pub id: NpcId,
    /// Name shown to the player and used as the speaker label.
    pub display_name: String,
}

impl NpcProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: NpcId::new(id),
            display_name: display_name.into(),
        }
    }
}

/// Word-level alignment between the target-language text and its gloss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAlignment {
    /// The word as written in the target language.
    pub source_word: String,
    /// Romanized reading of the word.
    pub transliteration: String,
    /// English gloss of the word.
    pub gloss_english: String,
    /// Part-of-speech tag.
    pub part_of_speech: String,
}

/// One utterance in a conversation, spoken by either the player or the NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTranscript {
    /// Stable turn identifier.
    pub id: TurnId,
    /// Speaker label ("Player name" or the NPC display name).
    pub speaker: String,
    /// Whether the NPC spoke this turn.
    pub is_npc: bool,
    /// Target-language text.
    pub raw_text: String,
    /// English translation of `raw_text`.
    pub english_gloss: String,
    /// Audio artifact of the utterance, when one exists.
    pub audio: Option<PathBuf>,
    /// Word-level alignments of `raw_text`.
    pub word_alignments: Vec<WordAlignment>,
    /// When the turn was created.
    pub created_at: DateTime<Utc>,
}

impl TurnTranscript {
    /// Renders the turn as a `"Speaker: text"` transcript line.
    #[must_use]
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.speaker, self.raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transcript_line_joins_speaker_and_text() {
        // Arrange
        let turn = TurnTranscript {
            id: TurnId(Uuid::nil()),
            speaker: "Mina".to_owned(),
            is_npc: true,
            raw_text: "안녕하세요".to_owned(),
            english_gloss: "Hello".to_owned(),
            audio: None,
            word_alignments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        };

        // Act
        let line = turn.transcript_line();

        // Assert
        assert_eq!(line, "Mina: 안녕하세요");
    }

    #[test]
    fn test_turn_id_serializes_as_bare_uuid() {
        let id = TurnId(Uuid::from_u128(7));

        let json = serde_json::to_value(id).unwrap();

        assert_eq!(json, serde_json::json!("00000000-0000-0000-0000-000000000007"));
    }
}
