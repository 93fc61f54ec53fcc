//! Conversation state: turns, the snapshot store, and the chat session that
//! feeds debates into it.

pub mod publisher;
pub mod session;
pub mod store;
pub mod types;

pub use publisher::StorePublisher;
pub use session::{ChatSession, SessionError, SubmitOutcome};
pub use store::{
    ConversationSnapshot, ConversationStore, SharedConversationStore, StoreError, StoreResult,
};
pub use types::{ConversationTurn, TurnBody, TurnId};
