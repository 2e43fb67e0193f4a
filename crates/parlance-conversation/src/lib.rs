//! Parlance — Turn Orchestrator.
//!
//! Drives one conversation with one NPC through capture, submission,
//! reveal and commit, keeping history, charm and the on-screen turn
//! consistent.

pub mod application;
pub mod config;
pub mod domain;

pub use application::orchestrator::{Collaborators, Conversation, SubmissionHandle};
pub use config::ConversationConfig;
pub use domain::live_turn::LiveTurn;
pub use domain::state::{ConversationView, TurnState};
