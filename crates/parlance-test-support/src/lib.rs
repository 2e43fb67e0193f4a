//! Shared test doubles and fixtures for the Parlance engine.

mod clock;
mod devices;
mod dialogue;
mod events;
mod fixtures;
mod ids;

pub use clock::{FixedClock, ManualScheduler};
pub use devices::{FakePlayer, FakeRecorder, PlayerCall, RecorderCall};
pub use dialogue::{DialogueGate, ScriptedDialogue};
pub use events::RecordingPublisher;
pub use fixtures::{alignment, fixed_time, npc_turn, player_turn, reply};
pub use ids::{SequentialIds, turn_id};
