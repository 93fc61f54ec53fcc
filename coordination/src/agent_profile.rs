//! Agent directory — the fixed, ordered set of debate personas.
//!
//! Every persona is the same hosted model family wearing a different
//! instruction string. The directory is the single source of truth for which
//! agents take part in a round and in which order their responses appear.
//!
//! # Default personas
//!
//! - **gemini**: native, precise, reasoning-focused
//! - **gpt**: direct, concise, logical (simulated)
//! - **claude**: nuanced, safety-minded, edge-case hunter (simulated)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Stable identifier of a persona (e.g. `"gemini"`).
///
/// Not a closed enum: the directory decides which agents exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and persona of one debate participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable identifier, used to label responses and folded context.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Display color hint for front ends.
    #[serde(default)]
    pub color: String,
    /// Single-glyph avatar.
    #[serde(default)]
    pub avatar: String,
    /// One-line description shown next to the name.
    #[serde(default)]
    pub description: String,
    /// Persona instruction sent as the system preamble.
    pub system_instruction: String,
    /// Underlying model selector for this persona.
    pub model: String,
}

/// Errors raised while validating a directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("agent directory is empty")]
    Empty,

    #[error("duplicate agent id: {0}")]
    DuplicateId(AgentId),

    #[error("agent {0} has no persona instruction")]
    MissingInstruction(AgentId),

    #[error("agent {0} has no model selector")]
    MissingModel(AgentId),
}

/// Ordered, immutable list of personas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDirectory {
    agents: Vec<AgentProfile>,
}

impl AgentDirectory {
    /// Validate and wrap a list of profiles. Order is preserved.
    pub fn new(agents: Vec<AgentProfile>) -> Result<Self, DirectoryError> {
        if agents.is_empty() {
            return Err(DirectoryError::Empty);
        }

        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.id.clone()) {
                return Err(DirectoryError::DuplicateId(agent.id.clone()));
            }
            if agent.system_instruction.trim().is_empty() {
                return Err(DirectoryError::MissingInstruction(agent.id.clone()));
            }
            if agent.model.trim().is_empty() {
                return Err(DirectoryError::MissingModel(agent.id.clone()));
            }
        }

        Ok(Self { agents })
    }

    /// The built-in three-persona directory.
    pub fn builtin() -> Self {
        Self {
            agents: vec![
                AgentProfile {
                    id: AgentId::new("gemini"),
                    name: "Gemini 3.0".to_string(),
                    color: "blue".to_string(),
                    avatar: "G".to_string(),
                    description: "Multimodal, reasoning-focused native model.".to_string(),
                    system_instruction: "You are Gemini 3.0. You are helpful, precise, and \
                        capable of complex reasoning. Answer the user prompt directly."
                        .to_string(),
                    model: "gemini-3-pro-preview".to_string(),
                },
                AgentProfile {
                    id: AgentId::new("gpt"),
                    name: "ChatGPT 5.1 (Sim)".to_string(),
                    color: "emerald".to_string(),
                    avatar: "O".to_string(),
                    description: "Simulated persona of a high-reasoning O-series model."
                        .to_string(),
                    system_instruction: "Roleplay as \"ChatGPT 5.1\". You are direct, concise, \
                        and extremely logical. Your goal is to provide the most accurate answer \
                        possible. If you disagree with others, state why clearly."
                        .to_string(),
                    model: "gemini-2.5-flash".to_string(),
                },
                AgentProfile {
                    id: AgentId::new("claude"),
                    name: "Claude 4.5 (Sim)".to_string(),
                    color: "orange".to_string(),
                    avatar: "C".to_string(),
                    description: "Simulated persona of a nuanced, safe, and literary model."
                        .to_string(),
                    system_instruction: "Roleplay as \"Claude 4.5\". You are thoughtful, \
                        nuanced, and prioritize safety and ethical considerations. You often \
                        consider edge cases others miss."
                        .to_string(),
                    model: "gemini-2.5-flash".to_string(),
                },
            ],
        }
    }

    /// Profiles in directory order.
    pub fn agents(&self) -> &[AgentProfile] {
        &self.agents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AgentProfile> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Look up a profile by id.
    pub fn get(&self, id: &AgentId) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| &a.id == id)
    }

    /// Agent ids in directory order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id.clone()).collect()
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a AgentDirectory {
    type Item = &'a AgentProfile;
    type IntoIter = std::slice::Iter<'a, AgentProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}
