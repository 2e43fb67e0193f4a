//! Canned turns and replies.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parlance_core::turn::{TurnTranscript, WordAlignment};
use parlance_protocol::TurnReply;

use crate::ids::turn_id;

/// The instant every fixture turn is stamped with (2026-01-15T10:00:00Z).
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_768_471_200, 0).unwrap_or_default()
}

/// A finalized player turn with id `n` spoken by "Player".
#[must_use]
pub fn player_turn(n: u64, text: &str) -> TurnTranscript {
    TurnTranscript {
        id: turn_id(n),
        speaker: "Player".to_owned(),
        is_npc: false,
        raw_text: text.to_owned(),
        english_gloss: String::new(),
        audio: None,
        word_alignments: Vec::new(),
        created_at: fixed_time(),
    }
}

/// A finalized NPC turn with id `n`.
#[must_use]
pub fn npc_turn(n: u64, speaker: &str, text: &str) -> TurnTranscript {
    TurnTranscript {
        id: turn_id(n),
        speaker: speaker.to_owned(),
        is_npc: true,
        raw_text: text.to_owned(),
        english_gloss: format!("({text})"),
        audio: None,
        word_alignments: Vec::new(),
        created_at: fixed_time(),
    }
}

/// A single-word alignment entry.
#[must_use]
pub fn alignment(word: &str, gloss: &str) -> WordAlignment {
    WordAlignment {
        source_word: word.to_owned(),
        transliteration: String::new(),
        gloss_english: gloss.to_owned(),
        part_of_speech: "noun".to_owned(),
    }
}

/// A dialogue reply carrying `npc_text`, a charm delta and optional audio.
#[must_use]
pub fn reply(npc_text: &str, charm_delta: i32, npc_audio: Option<PathBuf>) -> TurnReply {
    TurnReply {
        player_text: "빵 주세요".to_owned(),
        player_alignments: vec![alignment("빵", "bread")],
        npc_text: npc_text.to_owned(),
        npc_english: format!("[{npc_text}]"),
        npc_alignments: Vec::new(),
        charm_delta,
        npc_audio,
    }
}
