//! Side-channel turn metadata.
//!
//! Carried in a response header as base64-encoded UTF-8 JSON:
//!
//! ```json
//! {
//!   "input_target": "...",
//!   "input_mapping": [{"word_target": "", "word_translit": "", "word_eng": "", "pos": ""}],
//!   "response_target": "...",
//!   "response_english": "...",
//!   "response_mapping": [...],
//!   "charm_delta": -3
//! }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parlance_core::turn::WordAlignment;
use serde::{Deserialize, Serialize};

/// One word mapping as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireWordMapping {
    /// Target-language word.
    pub word_target: String,
    /// Transliteration.
    pub word_translit: String,
    /// English gloss.
    pub word_eng: String,
    /// Part of speech.
    pub pos: String,
}

impl From<WireWordMapping> for WordAlignment {
    fn from(wire: WireWordMapping) -> Self {
        Self {
            source_word: wire.word_target,
            transliteration: wire.word_translit,
            gloss_english: wire.word_eng,
            part_of_speech: wire.pos,
        }
    }
}

/// Decoded turn metadata. `input_target` and `response_target` are
/// required; every other key degrades to an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// What the service heard the player say.
    pub input_target: String,
    /// Word alignments of the player's utterance.
    #[serde(default)]
    pub input_mapping: Vec<WireWordMapping>,
    /// The NPC's reply in the target language.
    pub response_target: String,
    /// English gloss of the reply.
    #[serde(default)]
    pub response_english: String,
    /// Word alignments of the reply.
    #[serde(default)]
    pub response_mapping: Vec<WireWordMapping>,
    /// Signed charm adjustment for this turn.
    #[serde(default)]
    pub charm_delta: i32,
}

impl TurnMetadata {
    /// Decodes a base64 header value into metadata.
    ///
    /// # Errors
    ///
    /// Returns a description of the first decoding step that failed.
    pub fn decode(header_value: &str) -> Result<Self, String> {
        let raw = STANDARD
            .decode(header_value.trim())
            .map_err(|e| format!("metadata is not valid base64: {e}"))?;
        let text =
            String::from_utf8(raw).map_err(|e| format!("metadata is not valid UTF-8: {e}"))?;
        serde_json::from_str(&text).map_err(|e| format!("metadata is not valid JSON: {e}"))
    }

    /// Encodes metadata the way the service sends it.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing plain strings and integers cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        STANDARD.encode(json)
    }
}

/// Converts wire mappings into domain alignments.
#[must_use]
pub fn into_alignments(mappings: Vec<WireWordMapping>) -> Vec<WordAlignment> {
    mappings.into_iter().map(WordAlignment::from).collect()
}
