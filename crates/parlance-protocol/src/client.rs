//! reqwest-backed `DialogueService`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parlance_core::error::TurnError;
use parlance_core::scratch::ScratchSpace;
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument, warn};

use crate::config::ClientConfig;
use crate::response::decode_turn_response;
use crate::service::{DialogueService, TurnReply, TurnRequest};

/// Multipart form field names.
pub mod fields {
    /// The recorded utterance.
    pub const AUDIO: &str = "audio";
    /// NPC identifier.
    pub const NPC_ID: &str = "npc_id";
    /// NPC display name.
    pub const NPC_NAME: &str = "npc_name";
    /// Current charm level.
    pub const CHARM_LEVEL: &str = "charm_level";
    /// Flattened prior transcript.
    pub const HISTORY: &str = "history";
}

/// HTTP client for the dialogue backend.
#[derive(Debug, Clone)]
pub struct HttpDialogueClient {
    http: reqwest::Client,
    config: ClientConfig,
    scratch: Arc<ScratchSpace>,
}

impl HttpDialogueClient {
    /// Creates a client. Reply audio is written into `scratch`.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, scratch: Arc<ScratchSpace>) -> Result<Self, TurnError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TurnError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            scratch,
        })
    }

    async fn build_form(&self, request: &TurnRequest) -> Result<Form, TurnError> {
        let file = tokio::fs::File::open(&request.recording)
            .await
            .map_err(|e| storage_error(&request.recording, &e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| storage_error(&request.recording, &e))?
            .len();
        let file_name = request
            .recording
            .file_name()
            .map_or_else(|| "recording".to_owned(), |n| n.to_string_lossy().into_owned());
        let audio = Part::stream_with_length(file, length).file_name(file_name);

        Ok(Form::new()
            .text(fields::NPC_ID, request.npc.id.to_string())
            .text(fields::NPC_NAME, request.npc.display_name.clone())
            .text(fields::CHARM_LEVEL, request.charm.value().to_string())
            .text(fields::HISTORY, request.history_transcript.clone())
            .part(fields::AUDIO, audio))
    }
}

#[async_trait]
impl DialogueService for HttpDialogueClient {
    #[instrument(skip(self, request), fields(npc_id = %request.npc.id))]
    async fn submit_turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError> {
        let form = self.build_form(&request).await?;
        let started = Instant::now();

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "dialogue request failed");
                TurnError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TurnError::Transport(format!("failed to read response body: {e}")))?;
        info!(
            status,
            bytes = body.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "dialogue service responded"
        );

        let decoded = decode_turn_response(status, &headers, &self.config.metadata_header, body)?;
        let npc_audio = if decoded.audio.is_empty() {
            None
        } else {
            let path = self
                .scratch
                .write("reply", &self.config.reply_audio_extension, &decoded.audio)
                .await
                .map_err(|e| TurnError::Storage(e.to_string()))?;
            Some(path)
        };

        Ok(TurnReply::from_metadata(decoded.metadata, npc_audio))
    }
}

fn storage_error(path: &std::path::Path, err: &std::io::Error) -> TurnError {
    TurnError::Storage(format!("cannot read recording {}: {err}", path.display()))
}
