//! The per-NPC turn orchestrator.
//!
//! A `Conversation` owns the turn state machine of one NPC view. Its
//! mutable state sits behind a single mutex that is never held across an
//! await point; every asynchronous continuation (capture, submission,
//! reveal tick, error timer) re-locks and checks that the conversation is
//! still live, and for submissions that the epoch it started in is still
//! current, before touching anything.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parlance_core::charm::CharmLevel;
use parlance_core::clock::{Clock, Scheduler, TickFlow};
use parlance_core::device::{AudioPlayer, AudioRecorder};
use parlance_core::error::{GENERIC_FAILURE_MESSAGE, TurnError};
use parlance_core::event::{ConversationEvent, EventPublisher};
use parlance_core::id::TurnIdSource;
use parlance_core::scratch::ScratchSpace;
use parlance_core::turn::{NpcProfile, TurnId, TurnTranscript};
use parlance_history::HistoryStore;
use parlance_protocol::{DialogueService, TurnReply, TurnRequest};
use parlance_reveal::{RevealHandle, RevealRequest, RevealStart, Revealer};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, instrument, warn};

use super::reveal_bridge::RevealBridge;
use crate::config::ConversationConfig;
use crate::domain::live_turn::LiveTurn;
use crate::domain::state::{ConversationView, TurnState};

/// Collaborators a conversation talks to. Cheap to clone; one set is
/// usually shared by every conversation of a session.
#[derive(Clone)]
pub struct Collaborators {
    /// Microphone capture.
    pub recorder: Arc<dyn AudioRecorder>,
    /// Audio output.
    pub player: Arc<dyn AudioPlayer>,
    /// The remote dialogue service.
    pub dialogue: Arc<dyn DialogueService>,
    /// Timer source for reveal ticks and error auto-dismissal.
    pub scheduler: Arc<dyn Scheduler>,
    /// Temp files for recorded and received audio.
    pub scratch: Arc<ScratchSpace>,
    /// Session-wide history.
    pub history: Arc<HistoryStore>,
    /// Source of `created_at` timestamps.
    pub clock: Arc<dyn Clock>,
    /// Source of turn ids.
    pub ids: Arc<dyn TurnIdSource>,
    /// Sink for conversation events.
    pub events: Arc<dyn EventPublisher>,
}

struct ActiveReveal {
    handle: RevealHandle,
    player_turn: TurnId,
    npc_turn: TurnId,
}

struct Inner {
    state: TurnState,
    live: bool,
    /// Bumped on every submission and on teardown; a reply is applied only
    /// if the epoch it was submitted in is still current.
    epoch: u64,
    charm: CharmLevel,
    projection: Option<LiveTurn>,
    reveal: Option<ActiveReveal>,
    error_timer: Option<CancellationToken>,
}

impl Inner {
    fn ensure_live(&self) -> Result<(), TurnError> {
        if self.live {
            Ok(())
        } else {
            Err(TurnError::Closed)
        }
    }

    fn require(&self, expected: &TurnState, operation: &'static str) -> Result<(), TurnError> {
        self.ensure_live()?;
        if self.state == *expected {
            Ok(())
        } else {
            Err(TurnError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn accepts_reply(&self, epoch: u64) -> bool {
        self.live && self.epoch == epoch && self.state == TurnState::Submitting
    }

    fn is_revealing(&self, npc_turn: TurnId) -> bool {
        self.live
            && self
                .reveal
                .as_ref()
                .is_some_and(|reveal| reveal.npc_turn == npc_turn)
    }

    /// Returns to `Idle` after an abandoned capture, unless something else
    /// (teardown) has moved the state on meanwhile.
    fn abandon(&mut self, from: &TurnState) {
        if self.state == *from {
            self.state = TurnState::Idle;
        }
    }
}

pub(super) struct Shared {
    npc: NpcProfile,
    config: ConversationConfig,
    deps: Collaborators,
    revealer: Revealer,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ConversationEvent) {
        debug!(npc_id = %self.npc.id, event_type = event.event_type(), "publishing event");
        self.deps.events.publish(event);
    }

    async fn run_submission(
        self: Arc<Self>,
        epoch: u64,
        request: TurnRequest,
    ) -> Result<(), TurnError> {
        let recording = request.recording.clone();
        match self.deps.dialogue.submit_turn(request).await {
            Ok(reply) => self.accept_reply(epoch, recording, reply).await,
            Err(err) => {
                let mut inner = self.lock();
                if inner.accepts_reply(epoch) {
                    self.enter_error(&mut inner, &err);
                } else {
                    debug!(npc_id = %self.npc.id, error = %err, "ignoring failure of a stale submission");
                }
                Err(err)
            }
        }
    }

    /// Commits the player's turn and the charm change, then starts revealing
    /// the NPC reply. All-or-nothing: a stale reply mutates nothing.
    async fn accept_reply(
        self: &Arc<Self>,
        epoch: u64,
        recording: PathBuf,
        reply: TurnReply,
    ) -> Result<(), TurnError> {
        if let Some(audio) = &reply.npc_audio {
            self.deps.scratch.defer_delete(audio.clone());
        }

        let (handle, request, npc_turn) = {
            let mut inner = self.lock();
            if !inner.accepts_reply(epoch) {
                info!(npc_id = %self.npc.id, "discarding reply for a conversation that moved on");
                return Err(TurnError::Closed);
            }

            let player = TurnTranscript {
                id: self.deps.ids.next_id(),
                speaker: self.config.player_speaker.clone(),
                is_npc: false,
                raw_text: reply.player_text,
                english_gloss: String::new(),
                audio: Some(recording),
                word_alignments: reply.player_alignments,
                created_at: self.deps.clock.now(),
            };
            let player_turn = player.id;
            if let Err(e) = self.deps.history.append(&self.npc.id, player.clone()) {
                let err = TurnError::Storage(e.to_string());
                self.enter_error(&mut inner, &err);
                return Err(err);
            }
            self.publish(ConversationEvent::TurnFinalized {
                npc_id: self.npc.id.clone(),
                turn: player,
            });

            let change = inner.charm.apply(reply.charm_delta);
            inner.charm = change.after;
            if change.changed() {
                info!(
                    npc_id = %self.npc.id,
                    before = change.before.value(),
                    after = change.after.value(),
                    "charm changed"
                );
                self.publish(ConversationEvent::CharmChanged {
                    npc_id: self.npc.id.clone(),
                    before: change.before,
                    after: change.after,
                });
            }
            if change.reached_max() {
                info!(npc_id = %self.npc.id, "charm reached maximum");
                self.publish(ConversationEvent::MaxCharmReached {
                    npc_id: self.npc.id.clone(),
                });
            }

            let npc = TurnTranscript {
                id: self.deps.ids.next_id(),
                speaker: self.npc.display_name.clone(),
                is_npc: true,
                raw_text: reply.npc_text.clone(),
                english_gloss: reply.npc_english,
                audio: reply.npc_audio.clone(),
                word_alignments: reply.npc_alignments,
                created_at: self.deps.clock.now(),
            };
            let npc_turn = npc.id;
            inner.projection = Some(LiveTurn::animating(npc));
            inner.state = TurnState::Animating;

            let handle = RevealHandle::new();
            inner.reveal = Some(ActiveReveal {
                handle: handle.clone(),
                player_turn,
                npc_turn,
            });
            let request = RevealRequest {
                text: reply.npc_text,
                audio: reply.npc_audio,
            };
            (handle, request, npc_turn)
        };

        let sink = Arc::new(RevealBridge::new(Arc::downgrade(self), npc_turn));
        match self.revealer.start(&handle, request, sink).await {
            RevealStart::Scheduled(rate) => debug!(
                npc_id = %self.npc.id,
                turn_id = %npc_turn,
                per_char_ms = u64::try_from(rate.per_char.as_millis()).unwrap_or(u64::MAX),
                "reveal scheduled"
            ),
            RevealStart::Completed => debug!(npc_id = %self.npc.id, "empty reply revealed at once"),
            RevealStart::Cancelled => debug!(npc_id = %self.npc.id, "reveal cancelled before its first tick"),
        }
        Ok(())
    }

    fn enter_error(self: &Arc<Self>, inner: &mut Inner, err: &TurnError) {
        if matches!(err, TurnError::PermissionDenied) {
            inner.state = TurnState::Idle;
            return;
        }
        warn!(npc_id = %self.npc.id, error = %err, "turn failed");

        let interval = self.config.error_display();
        if interval.is_zero() {
            inner.state = TurnState::Idle;
            return;
        }
        let message = err
            .user_message()
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned());
        inner.state = TurnState::ErrorDisplay { message };

        let shared = Arc::downgrade(self);
        let epoch = inner.epoch;
        let timer = self.deps.scheduler.schedule_periodic(
            interval,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.expire_error(epoch);
                }
                TickFlow::Stop
            }),
        );
        if let Some(previous) = inner.error_timer.replace(timer) {
            previous.cancel();
        }
    }

    fn expire_error(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.live
            && inner.epoch == epoch
            && matches!(inner.state, TurnState::ErrorDisplay { .. })
        {
            inner.state = TurnState::Idle;
            inner.error_timer = None;
            debug!(npc_id = %self.npc.id, "error display expired");
        }
    }

    pub(super) fn show_progress(&self, npc_turn: TurnId, revealed: &str) {
        let mut inner = self.lock();
        if !inner.is_revealing(npc_turn) {
            return;
        }
        if let Some(projection) = inner.projection.as_mut() {
            projection.show_prefix(revealed);
        }
    }

    pub(super) fn complete_reveal(&self, npc_turn: TurnId) {
        let mut inner = self.lock();
        if !inner.is_revealing(npc_turn) {
            return;
        }
        if let Some(reveal) = inner.reveal.take() {
            self.commit_npc_turn(&mut inner, reveal.player_turn);
        }
        inner.state = TurnState::Idle;
        info!(npc_id = %self.npc.id, turn_id = %npc_turn, "turn completed");
    }

    fn commit_npc_turn(&self, inner: &mut Inner, player_turn: TurnId) {
        let Some(turn) = inner.projection.as_mut().and_then(LiveTurn::finalize) else {
            return;
        };
        let npc_turn = turn.id;
        if let Err(e) = self.deps.history.append(&self.npc.id, turn.clone()) {
            warn!(npc_id = %self.npc.id, error = %e, "failed to record npc turn");
            return;
        }
        self.publish(ConversationEvent::TurnFinalized {
            npc_id: self.npc.id.clone(),
            turn,
        });
        self.publish(ConversationEvent::TurnCompleted {
            npc_id: self.npc.id.clone(),
            player_turn,
            npc_turn,
        });
    }

    /// Synchronous part of teardown. Returns `true` if a capture was in
    /// progress and still needs cancelling.
    fn teardown(&self) -> bool {
        let mut inner = self.lock();
        if !inner.live {
            return false;
        }
        inner.live = false;
        inner.epoch += 1;

        if let Some(timer) = inner.error_timer.take() {
            timer.cancel();
        }
        if let Some(reveal) = inner.reveal.take() {
            reveal.handle.cancel();
            self.commit_npc_turn(&mut inner, reveal.player_turn);
        }
        let was_recording = inner.state == TurnState::Recording;
        inner.state = TurnState::Idle;
        drop(inner);

        self.deps.player.stop();
        was_recording
    }
}

/// Completion handle of one submitted turn.
///
/// Dropping it detaches the submission; the conversation still applies the
/// reply when it arrives.
#[derive(Debug)]
pub struct SubmissionHandle {
    task: JoinHandle<Result<(), TurnError>>,
}

impl SubmissionHandle {
    /// Waits until the reply has been applied and its reveal started, or
    /// the turn failed.
    ///
    /// # Errors
    ///
    /// Returns the classified submission failure, or `TurnError::Closed`
    /// if the reply was discarded because the conversation was torn down.
    pub async fn settled(self) -> Result<(), TurnError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "submission task ended abnormally");
                Err(TurnError::Closed)
            }
        }
    }
}

/// One conversation with one NPC.
pub struct Conversation {
    shared: Arc<Shared>,
}

impl Conversation {
    /// Opens a conversation with `npc` at the given charm level.
    ///
    /// If the NPC already has history, its latest turn is shown as-is,
    /// without animating.
    #[must_use]
    pub fn open(
        npc: NpcProfile,
        charm: CharmLevel,
        deps: Collaborators,
        config: ConversationConfig,
    ) -> Self {
        let projection = deps.history.last(&npc.id).map(LiveTurn::restored);
        let revealer = Revealer::new(
            Arc::clone(&deps.scheduler),
            Arc::clone(&deps.player),
            config.reveal,
        );
        info!(
            npc_id = %npc.id,
            charm = charm.value(),
            restored = projection.is_some(),
            "conversation opened"
        );
        let inner = Inner {
            state: TurnState::Idle,
            live: true,
            epoch: 0,
            charm,
            projection,
            reveal: None,
            error_timer: None,
        };
        Self {
            shared: Arc::new(Shared {
                npc,
                config,
                deps,
                revealer,
                inner: Mutex::new(inner),
            }),
        }
    }

    /// The NPC spoken to.
    #[must_use]
    pub fn npc(&self) -> &NpcProfile {
        &self.shared.npc
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.shared.lock().state.clone()
    }

    /// Current charm level.
    #[must_use]
    pub fn charm(&self) -> CharmLevel {
        self.shared.lock().charm
    }

    /// Read-only view for the renderer.
    #[must_use]
    pub fn snapshot(&self) -> ConversationView {
        let (state, projection, charm) = {
            let inner = self.shared.lock();
            (inner.state.clone(), inner.projection.clone(), inner.charm)
        };
        ConversationView {
            npc: self.shared.npc.clone(),
            state,
            projection,
            charm,
            history: self.shared.deps.history.all(&self.shared.npc.id),
        }
    }

    /// Starts capturing the player's utterance.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidState` outside `Idle` (nothing happens),
    /// `TurnError::PermissionDenied` or `TurnError::Capture` if the
    /// microphone cannot be acquired (the conversation stays idle), and
    /// `TurnError::Closed` after teardown.
    #[instrument(skip(self), fields(npc_id = %self.shared.npc.id))]
    pub async fn begin_turn(&self) -> Result<(), TurnError> {
        let path = {
            let mut inner = self.shared.lock();
            inner.require(&TurnState::Idle, "begin_turn")?;
            inner.state = TurnState::Recording;
            self.shared
                .deps
                .scratch
                .allocate("recording", &self.shared.config.recording_extension)
        };

        if let Err(e) = self.shared.deps.recorder.start(&path).await {
            self.shared.lock().abandon(&TurnState::Recording);
            let err = TurnError::from(e);
            match &err {
                TurnError::PermissionDenied => debug!("microphone permission denied"),
                other => warn!(error = %other, "capture failed to start"),
            }
            return Err(err);
        }

        let live = self.shared.lock().live;
        if !live {
            self.shared.deps.recorder.cancel().await;
            return Err(TurnError::Closed);
        }
        info!(path = %path.display(), "recording started");
        Ok(())
    }

    /// Stops capturing and submits the utterance in the background.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidState` outside `Recording`,
    /// `TurnError::EmptyRecording` if capture produced nothing and
    /// `TurnError::Capture` if the recorder failed; in those cases the
    /// conversation is back to `Idle` and nothing was submitted.
    #[instrument(skip(self), fields(npc_id = %self.shared.npc.id))]
    pub async fn end_turn(&self) -> Result<SubmissionHandle, TurnError> {
        {
            let mut inner = self.shared.lock();
            inner.require(&TurnState::Recording, "end_turn")?;
            inner.state = TurnState::Submitting;
        }

        let recording = match self.shared.deps.recorder.stop().await {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.shared.lock().abandon(&TurnState::Submitting);
                info!("recording produced no audio");
                return Err(TurnError::EmptyRecording);
            }
            Err(e) => {
                self.shared.lock().abandon(&TurnState::Submitting);
                let err = TurnError::from(e);
                warn!(error = %err, "capture failed to stop");
                return Err(err);
            }
        };
        self.shared.deps.scratch.defer_delete(recording.clone());

        let (epoch, request) = {
            let mut inner = self.shared.lock();
            inner.require(&TurnState::Submitting, "end_turn")?;
            inner.epoch += 1;
            let request = TurnRequest {
                npc: self.shared.npc.clone(),
                charm: inner.charm,
                history_transcript: self
                    .shared
                    .deps
                    .history
                    .flattened_transcript(&self.shared.npc.id),
                recording,
            };
            (inner.epoch, request)
        };
        info!(charm = request.charm.value(), "submitting turn");

        let task = tokio::spawn(
            Arc::clone(&self.shared)
                .run_submission(epoch, request)
                .in_current_span(),
        );
        Ok(SubmissionHandle { task })
    }

    /// Clears a failure message before it expires on its own.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidState` when no error is shown and
    /// `TurnError::Closed` after teardown.
    pub fn dismiss_error(&self) -> Result<(), TurnError> {
        let mut inner = self.shared.lock();
        inner.ensure_live()?;
        if !matches!(inner.state, TurnState::ErrorDisplay { .. }) {
            return Err(TurnError::InvalidState {
                operation: "dismiss_error",
                state: inner.state.name(),
            });
        }
        inner.state = TurnState::Idle;
        if let Some(timer) = inner.error_timer.take() {
            timer.cancel();
        }
        Ok(())
    }

    /// Plays the recorded audio of a turn in history again, stopping
    /// whatever is playing first.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidState` while recording or animating,
    /// `TurnError::NothingToReplay` for unknown turns or turns without
    /// audio, and `TurnError::Storage` if the artifact cannot be played.
    #[instrument(skip(self), fields(npc_id = %self.shared.npc.id))]
    pub fn replay(&self, turn_id: TurnId) -> Result<(), TurnError> {
        {
            let inner = self.shared.lock();
            inner.ensure_live()?;
            if !inner.state.allows_replay() {
                return Err(TurnError::InvalidState {
                    operation: "replay",
                    state: inner.state.name(),
                });
            }
        }

        let audio = self
            .shared
            .deps
            .history
            .get(&self.shared.npc.id, turn_id)
            .and_then(|turn| turn.audio)
            .ok_or(TurnError::NothingToReplay)?;

        let player = &self.shared.deps.player;
        player.stop();
        player.play(&audio).map_err(|e| {
            warn!(error = %e, audio = %audio.display(), "replay failed");
            TurnError::Storage(e.to_string())
        })
    }

    /// Tears the conversation down: cancels the reveal and any error timer,
    /// stops playback, cancels an in-progress capture and makes a
    /// late-arriving reply a no-op. An NPC reply that was still animating
    /// is committed with its full text.
    #[instrument(skip(self), fields(npc_id = %self.shared.npc.id))]
    pub async fn close(&self) {
        if self.shared.teardown() {
            self.shared.deps.recorder.cancel().await;
        }
        info!("conversation closed");
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        if !self.shared.teardown() {
            return;
        }
        if let Ok(handle) = Handle::try_current() {
            let recorder = Arc::clone(&self.shared.deps.recorder);
            handle.spawn(async move { recorder.cancel().await });
        }
    }
}
