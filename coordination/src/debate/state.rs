//! Debate state: responses, rounds and status transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::consensus::ConsensusVerdict;
use crate::agent_profile::{AgentDirectory, AgentId, AgentProfile};

/// Prefix of every generator error placeholder.
pub const ERROR_MARKER: &str = "[Error simulating";

/// One agent's answer within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub agent_id: AgentId,
    pub content: String,
    /// True until the agent's generator call has settled.
    pub is_pending: bool,
}

impl AgentResponse {
    /// Placeholder published when a round starts.
    pub fn pending(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            content: String::new(),
            is_pending: true,
        }
    }

    pub fn completed(agent_id: AgentId, content: impl Into<String>) -> Self {
        Self {
            agent_id,
            content: content.into(),
            is_pending: false,
        }
    }

    /// Visible stand-in for a failed generator call.
    pub fn error_placeholder(agent: &AgentProfile, cause: &str) -> Self {
        Self::completed(
            agent.id.clone(),
            format!("{} {}: {}]", ERROR_MARKER, agent.name, cause),
        )
    }

    /// Whether this response is a generator error placeholder.
    pub fn is_error(&self) -> bool {
        self.content.starts_with(ERROR_MARKER)
    }
}

/// A single debate round: one response slot per agent, in directory order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Round number (1-indexed).
    pub round_number: u32,
    pub responses: Vec<AgentResponse>,
    /// Judge verdict for this round, once evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusVerdict>,
}

impl Round {
    /// A round with every directory slot pending.
    pub fn pending(round_number: u32, directory: &AgentDirectory) -> Self {
        Self {
            round_number,
            responses: directory
                .iter()
                .map(|agent| AgentResponse::pending(agent.id.clone()))
                .collect(),
            consensus: None,
        }
    }

    /// Whether every slot has settled.
    pub fn is_complete(&self) -> bool {
        self.responses.iter().all(|r| !r.is_pending)
    }

    pub fn pending_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_pending).count()
    }

    /// Whether `responses` fills exactly this round's slots, in order.
    pub fn slots_match(&self, responses: &[AgentResponse]) -> bool {
        self.responses.len() == responses.len()
            && self
                .responses
                .iter()
                .zip(responses)
                .all(|(slot, r)| slot.agent_id == r.agent_id)
    }
}

/// Status of a debate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    /// Rounds are still running.
    Debating,
    /// The judge found agreement.
    ConsensusReached,
    /// Round limit exhausted without agreement, or the loop itself failed.
    Failed,
}

impl DebateStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ConsensusReached | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(self) -> &'static [DebateStatus] {
        match self {
            Self::Debating => &[Self::Debating, Self::ConsensusReached, Self::Failed],
            Self::ConsensusReached | Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debating => write!(f, "debating"),
            Self::ConsensusReached => write!(f, "consensus_reached"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Rejected mutation of a [`DebateEntry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DebateEntryError {
    #[error("debate already finished as {0}")]
    Frozen(DebateStatus),

    #[error("round limit of {max} reached")]
    RoundLimit { max: u32 },

    #[error("expected round {expected}, got round {actual}")]
    OutOfOrder { expected: u32, actual: u32 },

    #[error("round index {index} out of bounds ({len} rounds)")]
    RoundIndex { index: usize, len: usize },

    #[error("responses for round {round} do not match the agent slots")]
    SlotMismatch { round: u32 },

    #[error("round {round} already has a verdict")]
    VerdictAlreadySet { round: u32 },

    #[error("invalid transition {from} → {to}")]
    InvalidTransition { from: DebateStatus, to: DebateStatus },
}

/// The debate owned by a system turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateEntry {
    /// Rounds in creation order (append-only).
    pub rounds: Vec<Round>,
    pub status: DebateStatus,
    /// Verdict attached with the terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_verdict: Option<ConsensusVerdict>,
    /// Maximum rounds allowed.
    pub max_rounds: u32,
}

impl DebateEntry {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            rounds: Vec::new(),
            status: DebateStatus::Debating,
            final_verdict: None,
            max_rounds,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Append the next round. Numbers must stay contiguous from 1.
    pub fn push_round(&mut self, round: Round) -> Result<(), DebateEntryError> {
        self.ensure_open()?;
        if self.rounds.len() >= self.max_rounds as usize {
            return Err(DebateEntryError::RoundLimit {
                max: self.max_rounds,
            });
        }
        let expected = self.rounds.len() as u32 + 1;
        if round.round_number != expected {
            return Err(DebateEntryError::OutOfOrder {
                expected,
                actual: round.round_number,
            });
        }
        self.rounds.push(round);
        Ok(())
    }

    /// Replace the response slots of the round at `index` (0-based).
    pub fn replace_responses(
        &mut self,
        index: usize,
        responses: Vec<AgentResponse>,
    ) -> Result<(), DebateEntryError> {
        self.ensure_open()?;
        let round = self.round_mut(index)?;
        if !round.slots_match(&responses) {
            return Err(DebateEntryError::SlotMismatch {
                round: round.round_number,
            });
        }
        round.responses = responses;
        Ok(())
    }

    /// Attach the judge verdict to the round at `index`. Write-once.
    pub fn attach_verdict(
        &mut self,
        index: usize,
        verdict: ConsensusVerdict,
    ) -> Result<(), DebateEntryError> {
        self.ensure_open()?;
        let round = self.round_mut(index)?;
        if round.consensus.is_some() {
            return Err(DebateEntryError::VerdictAlreadySet {
                round: round.round_number,
            });
        }
        round.consensus = Some(verdict);
        Ok(())
    }

    /// Move to `to`, recording `verdict` as the final verdict.
    pub fn transition(
        &mut self,
        to: DebateStatus,
        verdict: Option<ConsensusVerdict>,
    ) -> Result<(), DebateEntryError> {
        if !self.status.valid_transitions().contains(&to) {
            return Err(DebateEntryError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        if verdict.is_some() || to.is_terminal() {
            self.final_verdict = verdict;
        }
        Ok(())
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{}",
            self.status,
            self.rounds.len(),
            self.max_rounds
        )
    }

    fn ensure_open(&self) -> Result<(), DebateEntryError> {
        if self.status.is_terminal() {
            return Err(DebateEntryError::Frozen(self.status));
        }
        Ok(())
    }

    fn round_mut(&mut self, index: usize) -> Result<&mut Round, DebateEntryError> {
        let len = self.rounds.len();
        self.rounds
            .get_mut(index)
            .ok_or(DebateEntryError::RoundIndex { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> AgentDirectory {
        AgentDirectory::builtin()
    }

    fn answered(round: &Round, text: &str) -> Vec<AgentResponse> {
        round
            .responses
            .iter()
            .map(|r| AgentResponse::completed(r.agent_id.clone(), text))
            .collect()
    }

    #[test]
    fn test_pending_round_has_one_slot_per_agent() {
        let round = Round::pending(1, &directory());
        assert_eq!(round.responses.len(), 3);
        assert_eq!(round.pending_count(), 3);
        assert!(!round.is_complete());
        assert_eq!(round.responses[0].agent_id.as_str(), "gemini");
        assert_eq!(round.responses[2].agent_id.as_str(), "claude");
    }

    #[test]
    fn test_error_placeholder_is_recognisable() {
        let agent = &directory().agents()[1].clone();
        let resp = AgentResponse::error_placeholder(agent, "timeout");
        assert!(resp.is_error());
        assert!(!resp.is_pending);
        assert_eq!(resp.content, "[Error simulating ChatGPT 5.1 (Sim): timeout]");
        assert!(!AgentResponse::completed(agent.id.clone(), "4").is_error());
    }

    #[test]
    fn test_push_round_contiguous() {
        let mut entry = DebateEntry::new(3);
        entry.push_round(Round::pending(1, &directory())).unwrap();
        let err = entry
            .push_round(Round::pending(3, &directory()))
            .unwrap_err();
        assert_eq!(
            err,
            DebateEntryError::OutOfOrder {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_push_round_respects_limit() {
        let mut entry = DebateEntry::new(1);
        entry.push_round(Round::pending(1, &directory())).unwrap();
        let err = entry
            .push_round(Round::pending(2, &directory()))
            .unwrap_err();
        assert_eq!(err, DebateEntryError::RoundLimit { max: 1 });
        assert_eq!(entry.round_count(), 1);
    }

    #[test]
    fn test_replace_responses() {
        let mut entry = DebateEntry::new(3);
        let round = Round::pending(1, &directory());
        let filled = answered(&round, "4");
        entry.push_round(round).unwrap();
        entry.replace_responses(0, filled).unwrap();
        assert!(entry.rounds[0].is_complete());
    }

    #[test]
    fn test_replace_responses_rejects_reordered_slots() {
        let mut entry = DebateEntry::new(3);
        let round = Round::pending(1, &directory());
        let mut filled = answered(&round, "4");
        filled.swap(0, 1);
        entry.push_round(round).unwrap();
        let err = entry.replace_responses(0, filled).unwrap_err();
        assert_eq!(err, DebateEntryError::SlotMismatch { round: 1 });
    }

    #[test]
    fn test_replace_responses_index_out_of_bounds() {
        let mut entry = DebateEntry::new(3);
        let err = entry.replace_responses(0, vec![]).unwrap_err();
        assert_eq!(err, DebateEntryError::RoundIndex { index: 0, len: 0 });
    }

    #[test]
    fn test_verdict_is_write_once() {
        let mut entry = DebateEntry::new(3);
        entry.push_round(Round::pending(1, &directory())).unwrap();
        entry
            .attach_verdict(0, ConsensusVerdict::not_reached("split", vec![]))
            .unwrap();
        let err = entry
            .attach_verdict(0, ConsensusVerdict::reached("agree", None))
            .unwrap_err();
        assert_eq!(err, DebateEntryError::VerdictAlreadySet { round: 1 });
    }

    #[test]
    fn test_single_terminal_transition() {
        let mut entry = DebateEntry::new(3);
        entry
            .transition(
                DebateStatus::ConsensusReached,
                Some(ConsensusVerdict::reached("All agree", Some("4".into()))),
            )
            .unwrap();
        assert!(entry.is_complete());
        assert!(entry.final_verdict.is_some());

        let err = entry.transition(DebateStatus::Failed, None).unwrap_err();
        assert_eq!(
            err,
            DebateEntryError::InvalidTransition {
                from: DebateStatus::ConsensusReached,
                to: DebateStatus::Failed
            }
        );
        assert_eq!(entry.status, DebateStatus::ConsensusReached);
    }

    #[test]
    fn test_frozen_entry_rejects_rounds() {
        let mut entry = DebateEntry::new(3);
        entry.transition(DebateStatus::Failed, None).unwrap();
        let err = entry
            .push_round(Round::pending(1, &directory()))
            .unwrap_err();
        assert_eq!(err, DebateEntryError::Frozen(DebateStatus::Failed));
    }

    #[test]
    fn test_debating_to_debating_allowed() {
        let mut entry = DebateEntry::new(3);
        entry.transition(DebateStatus::Debating, None).unwrap();
        assert_eq!(entry.status, DebateStatus::Debating);
        assert!(entry.final_verdict.is_none());
    }

    #[test]
    fn test_status_line() {
        let mut entry = DebateEntry::new(3);
        entry.push_round(Round::pending(1, &directory())).unwrap();
        assert_eq!(entry.status_line(), "[debating] round 1/3");
    }

    #[test]
    fn test_status_display_and_serde() {
        assert_eq!(DebateStatus::ConsensusReached.to_string(), "consensus_reached");
        let json = serde_json::to_string(&DebateStatus::ConsensusReached).unwrap();
        assert_eq!(json, "\"consensus_reached\"");
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let resp = AgentResponse::pending(AgentId::new("gpt"));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["agentId"], "gpt");
        assert_eq!(json["isPending"], true);
    }
}
