//! Binds debate publish callbacks to one system turn in the store.

use tracing::warn;

use super::store::SharedConversationStore;
use super::types::TurnId;
use crate::debate::{AgentResponse, ConsensusVerdict, DebatePublisher, DebateStatus, Round};

/// Publisher that patches the debate owned by `turn_id`.
///
/// Rejected patches are logged and dropped; the debate keeps running.
pub struct StorePublisher {
    store: SharedConversationStore,
    turn_id: TurnId,
}

impl StorePublisher {
    pub fn new(store: SharedConversationStore, turn_id: TurnId) -> Self {
        Self { store, turn_id }
    }

    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }
}

impl DebatePublisher for StorePublisher {
    fn round_added(&self, round: Round) {
        let number = round.round_number;
        if let Err(e) = self.store.add_round(self.turn_id, round) {
            warn!(turn = %self.turn_id, round = number, error = %e, "Store rejected new round");
        }
    }

    fn round_responses_updated(&self, round_index: usize, responses: Vec<AgentResponse>) {
        if let Err(e) = self
            .store
            .update_round_responses(self.turn_id, round_index, responses)
        {
            warn!(turn = %self.turn_id, round_index, error = %e, "Store rejected responses");
        }
    }

    fn round_judged(&self, round_index: usize, verdict: ConsensusVerdict) {
        if let Err(e) = self
            .store
            .set_round_verdict(self.turn_id, round_index, verdict)
        {
            warn!(turn = %self.turn_id, round_index, error = %e, "Store rejected round verdict");
        }
    }

    fn status_changed(&self, status: DebateStatus, verdict: Option<ConsensusVerdict>) {
        if let Err(e) = self.store.set_status(self.turn_id, status, verdict) {
            warn!(turn = %self.turn_id, %status, error = %e, "Store rejected status change");
        }
    }
}
