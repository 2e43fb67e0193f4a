//! Conversation state and the on-screen turn.

pub mod live_turn;
pub mod state;
