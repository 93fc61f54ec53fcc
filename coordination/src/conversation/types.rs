//! Conversation turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::debate::DebateEntry;

/// Identifier of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a turn carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TurnBody {
    User { prompt: String },
    System { debate: DebateEntry },
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: TurnBody,
}

impl ConversationTurn {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self::with_body(TurnBody::User {
            prompt: prompt.into(),
        })
    }

    /// A system turn holding a fresh `debating` entry with no rounds.
    pub fn system(max_rounds: u32) -> Self {
        Self::with_body(TurnBody::System {
            debate: DebateEntry::new(max_rounds),
        })
    }

    fn with_body(body: TurnBody) -> Self {
        Self {
            id: TurnId::new(),
            created_at: Utc::now(),
            body,
        }
    }

    pub fn debate(&self) -> Option<&DebateEntry> {
        match &self.body {
            TurnBody::System { debate } => Some(debate),
            TurnBody::User { .. } => None,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.body {
            TurnBody::User { prompt } => Some(prompt),
            TurnBody::System { .. } => None,
        }
    }
}
