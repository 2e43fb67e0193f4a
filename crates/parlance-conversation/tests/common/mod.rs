//! Shared harness for conversation integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use parlance_conversation::{Collaborators, Conversation, ConversationConfig};
use parlance_core::charm::CharmLevel;
use parlance_core::error::TurnError;
use parlance_core::scratch::ScratchSpace;
use parlance_core::turn::NpcProfile;
use parlance_history::HistoryStore;
use parlance_test_support::{
    FakePlayer, FakeRecorder, FixedClock, ManualScheduler, RecordingPublisher, ScriptedDialogue,
    SequentialIds, fixed_time,
};
use tempfile::TempDir;

/// The NPC most tests talk to.
pub fn baker() -> NpcProfile {
    NpcProfile::new("npc-baker", "Baker")
}

/// A second NPC for independence tests.
pub fn florist() -> NpcProfile {
    NpcProfile::new("npc-florist", "Florist")
}

/// Fake collaborators wired together, with handles kept for assertions.
pub struct Harness {
    pub recorder: Arc<FakeRecorder>,
    pub player: Arc<FakePlayer>,
    pub dialogue: Arc<ScriptedDialogue>,
    pub scheduler: Arc<ManualScheduler>,
    pub history: Arc<HistoryStore>,
    pub events: Arc<RecordingPublisher>,
    pub scratch: Arc<ScratchSpace>,
    ids: Arc<SequentialIds>,
    _dir: TempDir,
}

impl Harness {
    /// Capturing recorder and a player whose probes report no duration.
    pub fn new(dialogue: ScriptedDialogue) -> Self {
        Self::with_devices(dialogue, FakeRecorder::new(), FakePlayer::without_duration())
    }

    pub fn with_devices(dialogue: ScriptedDialogue, recorder: FakeRecorder, player: FakePlayer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            recorder: Arc::new(recorder),
            player: Arc::new(player),
            dialogue: Arc::new(dialogue),
            scheduler: Arc::new(ManualScheduler::new()),
            history: Arc::new(HistoryStore::new()),
            events: Arc::new(RecordingPublisher::new()),
            scratch: Arc::new(ScratchSpace::new(dir.path().join("scratch")).unwrap()),
            // Well clear of the small ids used by fixture turns.
            ids: Arc::new(SequentialIds::starting_at(100)),
            _dir: dir,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            recorder: self.recorder.clone(),
            player: self.player.clone(),
            dialogue: self.dialogue.clone(),
            scheduler: self.scheduler.clone(),
            scratch: self.scratch.clone(),
            history: self.history.clone(),
            clock: Arc::new(FixedClock(fixed_time())),
            ids: self.ids.clone(),
            events: self.events.clone(),
        }
    }

    /// Opens a conversation with the baker at `charm`.
    pub fn open(&self, charm: i64) -> Conversation {
        self.open_with(baker(), charm, ConversationConfig::default())
    }

    pub fn open_with(&self, npc: NpcProfile, charm: i64, config: ConversationConfig) -> Conversation {
        Conversation::open(npc, CharmLevel::clamped(charm), self.collaborators(), config)
    }

    /// Number of published events of `event_type`.
    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .event_types()
            .into_iter()
            .filter(|t| *t == event_type)
            .count()
    }
}

/// Records, submits and waits until the reply is applied.
pub async fn take_turn(conversation: &Conversation) -> Result<(), TurnError> {
    conversation.begin_turn().await?;
    conversation.end_turn().await?.settled().await
}
