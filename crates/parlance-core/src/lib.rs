//! Parlance Core — shared conversation abstractions.
//!
//! This crate defines the value types, error taxonomy and collaborator
//! ports (clock, scheduler, audio devices, scratch storage, event
//! publishing) that every other Parlance crate depends on.

pub mod charm;
pub mod clock;
pub mod device;
pub mod error;
pub mod event;
pub mod id;
pub mod scratch;
pub mod turn;
