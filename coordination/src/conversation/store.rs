//! Conversation State Store.
//!
//! Holds the ordered list of turns. Every write builds a new
//! [`ConversationSnapshot`] and swaps it in through a `watch` channel, so a
//! snapshot handed out earlier never changes. Turns are `Arc`-shared between
//! snapshots; only the turn a patch touches is rebuilt, which lets observers
//! find what changed by pointer comparison.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use super::types::{ConversationTurn, TurnBody, TurnId};
use crate::debate::{
    AgentResponse, ConsensusVerdict, DebateEntry, DebateEntryError, DebateStatus, Round,
};

/// Rejected store patch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("turn {0} not found")]
    TurnNotFound(TurnId),

    #[error("turn {0} does not own a debate")]
    NotADebate(TurnId),

    #[error(transparent)]
    Entry(#[from] DebateEntryError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared reference to a store
pub type SharedConversationStore = Arc<ConversationStore>;

/// Immutable view of the conversation at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub turns: Vec<Arc<ConversationTurn>>,
}

impl ConversationSnapshot {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, id: TurnId) -> Option<&Arc<ConversationTurn>> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// The debate owned by turn `id`, if it is a system turn.
    pub fn debate(&self, id: TurnId) -> Option<&DebateEntry> {
        self.get(id).and_then(|t| t.debate())
    }

    /// Ids of turns that are new or were rebuilt since `previous`.
    pub fn changed_turns(&self, previous: &ConversationSnapshot) -> Vec<TurnId> {
        self.turns
            .iter()
            .filter(|turn| match previous.get(turn.id) {
                Some(old) => !Arc::ptr_eq(old, turn),
                None => true,
            })
            .map(|turn| turn.id)
            .collect()
    }

    fn with_turn(&self, turn: ConversationTurn) -> Self {
        let mut turns = self.turns.clone();
        turns.push(Arc::new(turn));
        Self { turns }
    }

    fn patch_debate<F>(&self, id: TurnId, patch: F) -> StoreResult<Self>
    where
        F: FnOnce(&mut DebateEntry) -> Result<(), DebateEntryError>,
    {
        let pos = self
            .turns
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TurnNotFound(id))?;
        let turn = &self.turns[pos];
        let TurnBody::System { debate } = &turn.body else {
            return Err(StoreError::NotADebate(id));
        };

        let mut debate = debate.clone();
        patch(&mut debate)?;

        let mut turns = self.turns.clone();
        turns[pos] = Arc::new(ConversationTurn {
            id: turn.id,
            created_at: turn.created_at,
            body: TurnBody::System { debate },
        });
        Ok(Self { turns })
    }
}

/// Store of conversation turns with snapshot replacement semantics.
pub struct ConversationStore {
    sender: watch::Sender<Arc<ConversationSnapshot>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(ConversationSnapshot::default()));
        Self { sender }
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedConversationStore {
        Arc::new(self)
    }

    /// Current snapshot. Never mutated afterwards.
    pub fn snapshot(&self) -> Arc<ConversationSnapshot> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every accepted write.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ConversationSnapshot>> {
        self.sender.subscribe()
    }

    pub fn len(&self) -> usize {
        self.sender.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.borrow().is_empty()
    }

    pub fn append_turn(&self, turn: ConversationTurn) -> TurnId {
        let id = turn.id;
        self.sender
            .send_modify(|snapshot| *snapshot = Arc::new(snapshot.with_turn(turn)));
        debug!(turn = %id, "Turn appended");
        id
    }

    /// Append the next round to a debate.
    pub fn add_round(&self, turn_id: TurnId, round: Round) -> StoreResult<()> {
        self.patch(turn_id, |debate| debate.push_round(round))
    }

    /// Replace the response slots of round `round_index` (0-based).
    pub fn update_round_responses(
        &self,
        turn_id: TurnId,
        round_index: usize,
        responses: Vec<AgentResponse>,
    ) -> StoreResult<()> {
        self.patch(turn_id, |debate| {
            debate.replace_responses(round_index, responses)
        })
    }

    /// Attach the judge verdict to round `round_index` (0-based).
    pub fn set_round_verdict(
        &self,
        turn_id: TurnId,
        round_index: usize,
        verdict: ConsensusVerdict,
    ) -> StoreResult<()> {
        self.patch(turn_id, |debate| debate.attach_verdict(round_index, verdict))
    }

    pub fn set_status(
        &self,
        turn_id: TurnId,
        status: DebateStatus,
        verdict: Option<ConsensusVerdict>,
    ) -> StoreResult<()> {
        self.patch(turn_id, |debate| debate.transition(status, verdict))
    }

    /// Drop every turn.
    pub fn clear(&self) {
        self.sender
            .send_replace(Arc::new(ConversationSnapshot::default()));
        debug!("Conversation cleared");
    }

    fn patch<F>(&self, turn_id: TurnId, patch: F) -> StoreResult<()>
    where
        F: FnOnce(&mut DebateEntry) -> Result<(), DebateEntryError>,
    {
        let mut outcome = Ok(());
        self.sender.send_if_modified(|snapshot| {
            match snapshot.patch_debate(turn_id, patch) {
                Ok(next) => {
                    *snapshot = Arc::new(next);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
