//! One scripted conversation, start to finish.

use std::sync::Arc;

use parlance_conversation::{Collaborators, Conversation, TurnState};
use parlance_core::charm::CharmLevel;
use parlance_core::clock::{SystemClock, TokioScheduler};
use parlance_core::error::TurnError;
use parlance_core::event::{ChannelPublisher, ConversationEvent};
use parlance_core::id::TimeOrderedIds;
use parlance_core::scratch::ScratchSpace;
use parlance_core::turn::{NpcProfile, TurnTranscript};
use parlance_history::HistoryStore;
use parlance_protocol::HttpDialogueClient;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::config::Cli;
use crate::devices::{FileRecorder, LoggingPlayer};
use crate::error::AppError;

/// Outcome of a scripted session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// The NPC spoken to.
    pub npc: NpcProfile,
    /// Every turn committed to history, oldest first.
    pub turns: Vec<TurnTranscript>,
    /// Charm level at the end of the session.
    pub charm: CharmLevel,
    /// Turns the dialogue service or capture could not complete.
    pub failed_turns: usize,
}

/// Plays every recording in `cli` as one turn and returns the resulting
/// history and charm. Per-turn failures are counted, not fatal.
///
/// # Errors
///
/// Returns `AppError::Config` for an unusable endpoint, `AppError::Io` or
/// `AppError::Scratch` if scratch storage cannot be created, and
/// `AppError::Turn` if the HTTP client cannot be built or the conversation
/// ends up in an unexpected state.
pub async fn run(cli: &Cli) -> Result<SessionSummary, AppError> {
    let client_config = cli.client_config()?;
    let (scratch, _owned_dir) = open_scratch(cli)?;
    let client = HttpDialogueClient::new(client_config, Arc::clone(&scratch))?;
    let history = Arc::new(HistoryStore::new());
    let (publisher, mut events) = ChannelPublisher::channel();

    let npc = cli.npc();
    let deps = Collaborators {
        recorder: Arc::new(FileRecorder::new(cli.recordings.iter().cloned())),
        player: Arc::new(LoggingPlayer),
        dialogue: Arc::new(client),
        scheduler: Arc::new(TokioScheduler::current()),
        scratch: Arc::clone(&scratch),
        history: Arc::clone(&history),
        clock: Arc::new(SystemClock),
        ids: Arc::new(TimeOrderedIds),
        events: Arc::new(publisher),
    };
    let conversation = Conversation::open(
        npc.clone(),
        CharmLevel::clamped(i64::from(cli.charm)),
        deps,
        cli.conversation_config(),
    );

    let mut failed_turns = 0;
    for recording in &cli.recordings {
        info!(recording = %recording.display(), "taking turn");
        match take_turn(&conversation).await {
            Ok(()) => wait_for_completion(&mut events).await,
            Err(e @ (TurnError::InvalidState { .. } | TurnError::Closed)) => {
                conversation.close().await;
                return Err(e.into());
            }
            Err(e) => {
                failed_turns += 1;
                warn!(error = %e, "turn failed");
                if matches!(conversation.state(), TurnState::ErrorDisplay { .. }) {
                    conversation.dismiss_error()?;
                }
            }
        }
    }

    let charm = conversation.charm();
    conversation.close().await;
    drop(conversation);
    while let Ok(event) = events.try_recv() {
        log_event(&event);
    }
    let removed = scratch.purge().await;
    debug!(removed, "scratch purged");

    Ok(SessionSummary {
        turns: history.all(&npc.id),
        npc,
        charm,
        failed_turns,
    })
}

async fn take_turn(conversation: &Conversation) -> Result<(), TurnError> {
    conversation.begin_turn().await?;
    conversation.end_turn().await?.settled().await
}

/// Scratch storage for the session. Without `--scratch-dir` it lives in a
/// fresh temp directory, removed when the returned guard drops.
fn open_scratch(cli: &Cli) -> Result<(Arc<ScratchSpace>, Option<TempDir>), AppError> {
    if let Some(dir) = &cli.scratch_dir {
        return Ok((Arc::new(ScratchSpace::new(dir.clone())?), None));
    }
    let dir = tempfile::Builder::new().prefix("parlance-").tempdir()?;
    let scratch = ScratchSpace::new(dir.path())?;
    Ok((Arc::new(scratch), Some(dir)))
}

/// Logs events until the current turn's reveal has been committed.
async fn wait_for_completion(events: &mut UnboundedReceiver<ConversationEvent>) {
    while let Some(event) = events.recv().await {
        log_event(&event);
        if matches!(event, ConversationEvent::TurnCompleted { .. }) {
            return;
        }
    }
}

fn log_event(event: &ConversationEvent) {
    match event {
        ConversationEvent::MaxCharmReached { npc_id } => {
            info!(npc_id = %npc_id, "maximum charm reached");
        }
        other => info!(
            event_type = other.event_type(),
            npc_id = %other.npc_id(),
            "conversation event"
        ),
    }
}
