//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use parlance_conversation::ConversationConfig;
use parlance_core::turn::NpcProfile;
use parlance_protocol::ClientConfig;
use parlance_protocol::config::DEFAULT_METADATA_HEADER;

use crate::error::AppError;

/// Run a scripted conversation with one NPC.
#[derive(Parser, Debug, Clone)]
#[command(name = "parlance", about = "Scripted voice conversation with an NPC")]
pub struct Cli {
    /// Full URL of the dialogue service's turn endpoint.
    #[arg(long, env = "PARLANCE_ENDPOINT")]
    pub endpoint: String,

    /// Response header carrying the base64 turn metadata.
    #[arg(long, env = "PARLANCE_METADATA_HEADER", default_value = DEFAULT_METADATA_HEADER)]
    pub metadata_header: String,

    /// Upper bound on one round-trip, in seconds.
    #[arg(long, env = "PARLANCE_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Directory for scratch audio; a temp directory removed on exit when
    /// unset.
    #[arg(long, env = "PARLANCE_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Identifier of the NPC sent to the dialogue service.
    #[arg(long, env = "PARLANCE_NPC_ID", default_value = "npc-baker")]
    pub npc_id: String,

    /// Display name of the NPC, used as its speaker label.
    #[arg(long, env = "PARLANCE_NPC_NAME", default_value = "Baker")]
    pub npc_name: String,

    /// Starting charm level.
    #[arg(
        long,
        env = "PARLANCE_CHARM",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub charm: u8,

    /// Speaker label for the player's lines.
    #[arg(long, env = "PARLANCE_PLAYER_NAME", default_value = "Player")]
    pub player_name: String,

    /// Pre-recorded utterances, one per turn, in order.
    #[arg(required = true)]
    pub recordings: Vec<PathBuf>,
}

impl Cli {
    /// Settings for the HTTP dialogue client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` unless the endpoint is an `http` or
    /// `https` URL with a host.
    pub fn client_config(&self) -> Result<ClientConfig, AppError> {
        let endpoint = self.endpoint.trim();
        let host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .and_then(|rest| rest.split(['/', '?', '#']).next())
            .unwrap_or_default();
        if host.is_empty() {
            return Err(AppError::Config(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }
        Ok(ClientConfig {
            metadata_header: self.metadata_header.clone(),
            request_timeout_secs: self.timeout_secs,
            ..ClientConfig::new(endpoint)
        })
    }

    /// Settings for the conversation.
    #[must_use]
    pub fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig {
            player_speaker: self.player_name.clone(),
            ..ConversationConfig::default()
        }
    }

    /// The NPC to talk to.
    #[must_use]
    pub fn npc(&self) -> NpcProfile {
        NpcProfile::new(self.npc_id.clone(), self.npc_name.clone())
    }
}
