//! Dialogue client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default name of the response header carrying turn metadata.
pub const DEFAULT_METADATA_HEADER: &str = "x-turn-metadata";

/// Settings for `HttpDialogueClient`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the turn endpoint.
    pub endpoint: String,
    /// Response header carrying the base64 metadata.
    pub metadata_header: String,
    /// Upper bound on one round-trip, in seconds.
    pub request_timeout_secs: u64,
    /// File extension used for received reply audio.
    pub reply_audio_extension: String,
}

impl ClientConfig {
    /// Creates a configuration for `endpoint` with default settings.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/conversation/turn".to_owned(),
            metadata_header: DEFAULT_METADATA_HEADER.to_owned(),
            request_timeout_secs: 60,
            reply_audio_extension: "mp3".to_owned(),
        }
    }
}
