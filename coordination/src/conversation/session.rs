//! Chat session: the caller side of the orchestrator.
//!
//! Owns the store, admits one submission at a time, appends the user and
//! system turns and binds the debate's publish callbacks to the system turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use super::publisher::StorePublisher;
use super::store::{ConversationSnapshot, ConversationStore, SharedConversationStore};
use super::types::{ConversationTurn, TurnId};
use crate::debate::{DebateOrchestrator, DebateStatus};

/// Submission rejected before anything was appended.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("a debate is already running")]
    Busy,
}

/// Result of a finished submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// System turn holding the debate.
    pub turn_id: TurnId,
    pub status: DebateStatus,
}

pub struct ChatSession {
    store: SharedConversationStore,
    orchestrator: Arc<DebateOrchestrator>,
    in_flight: AtomicBool,
}

impl ChatSession {
    pub fn new(orchestrator: Arc<DebateOrchestrator>) -> Self {
        Self::with_store(ConversationStore::new().shared(), orchestrator)
    }

    pub fn with_store(
        store: SharedConversationStore,
        orchestrator: Arc<DebateOrchestrator>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one debate for `prompt` and wait for its terminal status.
    pub async fn submit(&self, prompt: &str) -> Result<SubmitOutcome, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SessionError::Busy)?;

        self.store.append_turn(ConversationTurn::user(prompt));
        let turn_id = self.store.append_turn(ConversationTurn::system(
            self.orchestrator.config().max_rounds,
        ));
        info!(turn = %turn_id, "Debate submitted");

        let publisher = StorePublisher::new(Arc::clone(&self.store), turn_id);
        let status = self.orchestrator.run_debate(prompt, &publisher).await;

        Ok(SubmitOutcome { turn_id, status })
    }

    /// Empty the conversation.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Arc<ConversationSnapshot> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ConversationSnapshot>> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &SharedConversationStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &DebateOrchestrator {
        &self.orchestrator
    }
}

/// Holds the in-flight flag; releases it on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
