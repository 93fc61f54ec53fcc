//! Debate Orchestration — Persona Fan-out / Judge Loop
//!
//! Each round asks every agent in the directory the same question, then a
//! judge decides whether they agree.
//!
//! # Debate Flow
//!
//! ```text
//! round r: placeholder → fan-out N generators → responses → judge
//!   │                                                         │
//!   │                                  ├─ consensus → ConsensusReached
//!   │                                  ├─ no, r < max → fold context, r+1
//!   │                                  └─ no, r = max → Failed
//!   └─ unexpected error at any point → Failed (no verdict)
//! ```

pub mod consensus;
pub mod errors;
pub mod orchestrator;
pub mod state;

pub use consensus::ConsensusVerdict;
pub use errors::{DebateError, GenerationError, JudgeError};
pub use orchestrator::{
    fold_context, ConsensusJudge, DebateConfig, DebateOrchestrator, DebatePublisher,
    ResponseGenerator,
};
pub use state::{AgentResponse, DebateEntry, DebateEntryError, DebateStatus, Round, ERROR_MARKER};
