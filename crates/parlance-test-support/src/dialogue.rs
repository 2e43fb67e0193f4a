//! Test dialogue services — scripted `DialogueService` implementations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parlance_core::error::TurnError;
use parlance_protocol::{DialogueService, TurnReply, TurnRequest};
use tokio::sync::Semaphore;

/// Holds scripted submissions until the test releases them.
#[derive(Debug, Clone)]
pub struct DialogueGate {
    permits: Arc<Semaphore>,
}

impl DialogueGate {
    /// Lets one waiting (or future) submission return its outcome.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

/// A dialogue service that answers from a queue of scripted outcomes and
/// records every request. Once the script runs out every call fails with a
/// transport error.
#[derive(Debug)]
pub struct ScriptedDialogue {
    outcomes: Mutex<VecDeque<Result<TurnReply, TurnError>>>,
    requests: Mutex<Vec<TurnRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedDialogue {
    /// Create a service that answers immediately with `outcomes`, in order.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = Result<TurnReply, TurnError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a service with nothing scripted; every call fails.
    #[must_use]
    pub fn exhausted() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a service that answers the first call with `reply`.
    #[must_use]
    pub fn replying(reply: TurnReply) -> Self {
        Self::new([Ok(reply)])
    }

    /// Create a service whose calls block until `DialogueGate::release`.
    #[must_use]
    pub fn gated(
        outcomes: impl IntoIterator<Item = Result<TurnReply, TurnError>>,
    ) -> (Self, DialogueGate) {
        let permits = Arc::new(Semaphore::new(0));
        let service = Self {
            gate: Some(Arc::clone(&permits)),
            ..Self::new(outcomes)
        };
        (service, DialogueGate { permits })
    }

    /// Returns a snapshot of every request received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueService for ScriptedDialogue {
    async fn submit_turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError> {
        self.requests.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(TurnError::Transport("gate closed".into())),
            }
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TurnError::Transport("connection refused".into())))
    }
}
