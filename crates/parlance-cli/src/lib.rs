//! Parlance — command-line driver.
//!
//! Plays a scripted conversation with one NPC against a live dialogue
//! backend, feeding pre-recorded audio files in place of a microphone.

pub mod config;
pub mod devices;
pub mod error;
pub mod session;
