//! Conversation tuning.

use std::time::Duration;

use parlance_reveal::RevealConfig;
use serde::Deserialize;

/// Per-conversation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Speaker label recorded on the player's turns.
    pub player_speaker: String,
    /// How long a failure message stays up before the conversation returns
    /// to idle on its own. Zero returns to idle immediately.
    pub error_display_ms: u64,
    /// File extension for recorded utterances.
    pub recording_extension: String,
    /// Reveal pacing.
    pub reveal: RevealConfig,
}

impl ConversationConfig {
    /// The error display interval as a `Duration`.
    #[must_use]
    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            player_speaker: "Player".to_owned(),
            error_display_ms: 3_000,
            recording_extension: "m4a".to_owned(),
            reveal: RevealConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversationConfig::default();

        assert_eq!(config.player_speaker, "Player");
        assert_eq!(config.error_display(), Duration::from_secs(3));
        assert_eq!(config.reveal.fallback_per_char_ms, 50);
    }
}
