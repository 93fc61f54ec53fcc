//! Error taxonomy for the debate loop.
//!
//! | Error             | Raised by            | Handling                               |
//! |-------------------|----------------------|----------------------------------------|
//! | `GenerationError` | response generator   | absorbed: error placeholder in slot    |
//! | `JudgeError`      | consensus judge      | absorbed: synthetic no-consensus verdict |
//! | `DebateError`     | orchestrator itself  | terminal `failed` status, no verdict   |

use std::time::Duration;

use thiserror::Error;

use crate::agent_profile::AgentId;

/// Failure of a single persona call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Inference request failed (network, service error, rate limit).
    #[error("{0}")]
    Inference(String),

    /// The call exceeded the configured per-agent timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// No backend agent was built for this persona.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The generator task panicked.
    #[error("generator panicked")]
    Panicked,
}

/// Failure of the consensus judge call.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Inference request failed.
    #[error("judge request failed: {0}")]
    Inference(String),

    /// The judge returned no text.
    #[error("empty response from judge")]
    EmptyResponse,

    /// The judge output did not match the verdict schema.
    #[error("malformed judge output: {0}")]
    Malformed(String),

    /// The judge task panicked or was cancelled.
    #[error("judge task failed: {0}")]
    Panicked(String),
}

/// Unexpected orchestration failure. Always ends the debate as `failed`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebateError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("round limit must be at least 1")]
    NoRounds,

    #[error("generator task lost: {0}")]
    TaskLost(String),

    #[error("no response collected for agent {0}")]
    MissingResponse(AgentId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_display_is_bare_cause() {
        let err = GenerationError::Inference("503 Service Unavailable".into());
        assert_eq!(err.to_string(), "503 Service Unavailable");
    }

    #[test]
    fn timeout_display_mentions_duration() {
        let err = GenerationError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn judge_error_display() {
        assert_eq!(
            JudgeError::EmptyResponse.to_string(),
            "empty response from judge"
        );
        assert!(JudgeError::Malformed("missing field `summary`".into())
            .to_string()
            .contains("summary"));
    }

    #[test]
    fn judge_panic_display() {
        let err = JudgeError::Panicked("judge panicked".into());
        assert_eq!(err.to_string(), "judge task failed: judge panicked");
    }

    #[test]
    fn debate_error_display() {
        let err = DebateError::MissingResponse(AgentId::new("gpt"));
        assert!(err.to_string().contains("gpt"));
    }
}
