//! Orchestration of capture, submission and reveal.

pub mod orchestrator;
mod reveal_bridge;
