//! Parlance — Backend Turn Protocol Client.
//!
//! Encodes a recorded player turn as a multipart request, decodes the
//! audio reply and its base64 side-channel metadata, and classifies every
//! failure into a `TurnError`.

pub mod client;
pub mod config;
pub mod error_body;
pub mod metadata;
pub mod response;
pub mod service;

pub use client::HttpDialogueClient;
pub use config::ClientConfig;
pub use service::{DialogueService, TurnReply, TurnRequest};
