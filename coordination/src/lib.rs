//! Consensus Chat Coordination Library
//!
//! This library provides the deterministic core of the consensus chat:
//! - Agent directory: the ordered set of debate personas
//! - Debate orchestration: per-round persona fan-out, judge verdict, round cap
//! - Conversation state: immutable snapshot store plus the chat session
//!
//! Model access is behind the [`debate::ResponseGenerator`] and
//! [`debate::ConsensusJudge`] traits; this crate makes no network calls.
//!
//! # Usage
//!
//! ```ignore
//! let orchestrator = DebateOrchestrator::new(directory, generator, judge);
//! let session = ChatSession::new(Arc::new(orchestrator));
//! let outcome = session.submit("What is 2+2?").await?;
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod agent_profile;
pub mod conversation;
pub mod debate;

// Re-export key types
pub use agent_profile::{AgentDirectory, AgentId, AgentProfile, DirectoryError};
pub use conversation::{
    ChatSession, ConversationSnapshot, ConversationStore, ConversationTurn, SessionError,
    SharedConversationStore, StoreError, SubmitOutcome, TurnBody, TurnId,
};
pub use debate::{
    AgentResponse, ConsensusJudge, ConsensusVerdict, DebateConfig, DebateEntry, DebateError,
    DebateOrchestrator, DebatePublisher, DebateStatus, GenerationError, JudgeError,
    ResponseGenerator, Round,
};
