//! Plain-text rendering of debate progress.
//!
//! The store publishes whole snapshots and a `watch` receiver may skip
//! intermediate ones, so [`ProgressPrinter`] diffs each snapshot against what
//! it already printed instead of relying on seeing every step.

use std::io::{self, Write};

use coordination::{
    AgentDirectory, AgentResponse, ConsensusVerdict, ConversationSnapshot, DebateEntry,
    DebateStatus, TurnId,
};

/// Incremental printer for the most recent debate in a conversation.
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    turn: Option<TurnId>,
    rounds_started: usize,
    rounds_answered: usize,
    rounds_judged: usize,
    finished: bool,
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print whatever the latest debate gained since the previous call.
    pub fn advance<W: Write>(
        &mut self,
        snapshot: &ConversationSnapshot,
        directory: &AgentDirectory,
        out: &mut W,
    ) -> io::Result<()> {
        let Some((turn_id, debate)) = snapshot
            .turns
            .iter()
            .rev()
            .find_map(|t| t.debate().map(|d| (t.id, d)))
        else {
            return Ok(());
        };

        if self.turn != Some(turn_id) {
            *self = Self {
                turn: Some(turn_id),
                ..Self::default()
            };
        }

        for round in &debate.rounds[self.rounds_started..] {
            writeln!(out, "── Round {}/{} ──", round.round_number, debate.max_rounds)?;
        }
        self.rounds_started = debate.rounds.len();

        while let Some(round) = debate.rounds.get(self.rounds_answered) {
            if !round.is_complete() {
                break;
            }
            for response in &round.responses {
                writeln!(out, "{}", render_response(directory, response))?;
            }
            self.rounds_answered += 1;
        }

        while let Some(verdict) = debate
            .rounds
            .get(self.rounds_judged)
            .and_then(|r| r.consensus.as_ref())
        {
            writeln!(out, "{}", render_verdict(verdict))?;
            self.rounds_judged += 1;
        }

        if debate.is_complete() && !self.finished {
            writeln!(out, "{}", render_outcome(debate))?;
            self.finished = true;
        }
        Ok(())
    }
}

/// One response line block, labelled with the agent's avatar and name.
pub fn render_response(directory: &AgentDirectory, response: &AgentResponse) -> String {
    let (avatar, name) = match directory.get(&response.agent_id) {
        Some(profile) if !profile.avatar.is_empty() => {
            (profile.avatar.as_str(), profile.name.as_str())
        }
        Some(profile) => ("?", profile.name.as_str()),
        None => ("?", response.agent_id.as_str()),
    };
    format!("[{avatar}] {name}:\n{}\n", response.content.trim_end())
}

/// Per-round judge verdict.
pub fn render_verdict(verdict: &ConsensusVerdict) -> String {
    let mark = if verdict.has_consensus { "agree" } else { "split" };
    let mut text = format!("Judge ({mark}): {}", verdict.summary);
    if let Some(points) = verdict.disagreements.as_deref() {
        for point in points {
            text.push_str(&format!("\n  - {point}"));
        }
    }
    text
}

/// Terminal line for a finished debate.
pub fn render_outcome(debate: &DebateEntry) -> String {
    let rounds = debate.rounds.len();
    let plural = if rounds == 1 { "" } else { "s" };
    match (debate.status, debate.final_verdict.as_ref()) {
        (DebateStatus::ConsensusReached, Some(verdict)) => {
            let answer = verdict
                .final_answer
                .as_deref()
                .unwrap_or(verdict.summary.as_str());
            format!("Consensus reached after {rounds} round{plural}.\nFinal answer: {answer}")
        }
        (DebateStatus::ConsensusReached, None) => {
            format!("Consensus reached after {rounds} round{plural}.")
        }
        (DebateStatus::Failed, Some(verdict)) => format!(
            "No consensus after {rounds} round{plural}: {}",
            verdict.summary
        ),
        (DebateStatus::Failed, None) => "Debate failed before a verdict was reached.".to_string(),
        (DebateStatus::Debating, _) => debate.status_line(),
    }
}
