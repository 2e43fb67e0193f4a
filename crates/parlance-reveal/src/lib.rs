//! Parlance — Synchronized Text Reveal Scheduler.
//!
//! Discloses an NPC reply one character per tick, with the tick interval
//! derived from the reply audio's duration so the text finishes just ahead
//! of the voice.

pub mod rate;
pub mod revealer;
pub mod typewriter;

pub use rate::{RateSource, RevealConfig, RevealRate};
pub use revealer::{RevealHandle, RevealRequest, RevealSink, RevealStart, Revealer};
