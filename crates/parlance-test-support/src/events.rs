//! Test publishers — `EventPublisher` implementations that keep what they see.

use std::sync::Mutex;

use parlance_core::event::{ConversationEvent, EventPublisher};

/// A publisher that records every event in publication order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<ConversationEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the type names of all published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(ConversationEvent::event_type)
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
