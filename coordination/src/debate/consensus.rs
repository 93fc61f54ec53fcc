//! The judge's structured decision for one round.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::errors::JudgeError;

/// Summary prefix of the synthetic verdict produced when the judge fails.
pub const EVALUATION_ERROR_PREFIX: &str = "Error evaluating consensus";

/// Disagreement recorded on a synthetic evaluation-error verdict.
pub const SYSTEM_ERROR_DISAGREEMENT: &str = "System error occurred.";

/// Judge decision on whether the agents agree.
///
/// Also the JSON schema handed to the judge model, so field docs double as
/// instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusVerdict {
    /// True if all models essentially agree on the core answer.
    pub has_consensus: bool,
    /// A brief summary of the state of the debate.
    pub summary: String,
    /// The consolidated answer if consensus is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String")]
    pub final_answer: Option<String>,
    /// Key points of contention if no consensus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Vec<String>")]
    pub disagreements: Option<Vec<String>>,
}

impl ConsensusVerdict {
    pub fn reached(summary: impl Into<String>, final_answer: Option<String>) -> Self {
        Self {
            has_consensus: true,
            summary: summary.into(),
            final_answer,
            disagreements: None,
        }
    }

    pub fn not_reached(summary: impl Into<String>, disagreements: Vec<String>) -> Self {
        Self {
            has_consensus: false,
            summary: summary.into(),
            final_answer: None,
            disagreements: Some(disagreements),
        }
    }

    /// Synthetic verdict for a failed judge call. Never signals consensus.
    pub fn evaluation_error(cause: &JudgeError) -> Self {
        Self::not_reached(
            format!("{EVALUATION_ERROR_PREFIX}: {cause}"),
            vec![SYSTEM_ERROR_DISAGREEMENT.to_string()],
        )
    }

    pub fn is_evaluation_error(&self) -> bool {
        !self.has_consensus && self.summary.starts_with(EVALUATION_ERROR_PREFIX)
    }

    /// Parse raw judge output. Accepts bare JSON, a ```json fence, or JSON
    /// embedded in surrounding prose.
    pub fn parse_judge_output(raw: &str) -> Result<Self, JudgeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(JudgeError::EmptyResponse);
        }
        let json = extract_json_block(trimmed)
            .ok_or_else(|| JudgeError::Malformed("no JSON object in output".into()))?;
        serde_json::from_str(json).map_err(|e| JudgeError::Malformed(e.to_string()))
    }
}

fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let body = start + "```json".len();
        if let Some(end) = text[body..].find("```") {
            return Some(text[body..body + end].trim());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
