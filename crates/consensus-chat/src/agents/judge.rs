//! Consensus judge agent.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use serde_json::{json, Value};
use tracing::debug;

use coordination::{AgentResponse, ConsensusJudge, ConsensusVerdict, JudgeError};

use crate::prompts;

use super::generator::OaiAgent;

/// `response_format` body constraining the judge to the verdict schema.
///
/// Passed through `additional_params`, which rig flattens into the request
/// JSON. Optional verdict fields are described with plain types; backends
/// that still reject the schema can turn it off with
/// `structured_output = false`.
pub fn verdict_response_format() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(ConsensusVerdict))
        .unwrap_or_else(|_| json!({ "type": "object" }));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    json!({
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "consensus_verdict",
                "schema": schema,
            }
        }
    })
}

/// Build the judge agent.
///
/// NO tools: the judge only sees the round's responses passed via prompt.
pub fn build_judge(
    client: &openai::CompletionsClient,
    model: &str,
    temperature: f64,
    structured_output: bool,
) -> OaiAgent {
    let mut builder = client
        .agent(model)
        .name("consensus_judge")
        .description("Decides whether the persona answers agree. Returns a JSON verdict.")
        .preamble(prompts::JUDGE_PREAMBLE)
        .temperature(temperature);

    if structured_output {
        builder = builder.additional_params(verdict_response_format());
    }

    builder.build()
}

/// [`ConsensusJudge`] over a rig agent.
pub struct RigConsensusJudge {
    agent: OaiAgent,
}

impl RigConsensusJudge {
    pub fn new(agent: OaiAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl ConsensusJudge for RigConsensusJudge {
    async fn judge(
        &self,
        prompt: &str,
        responses: &[AgentResponse],
    ) -> Result<ConsensusVerdict, JudgeError> {
        let request = prompts::judge_prompt(prompt, responses);
        let raw: String = self
            .agent
            .prompt(request.as_str())
            .await
            .map_err(|e| JudgeError::Inference(e.to_string()))?;

        debug!(
            prompt_version = prompts::PROMPT_VERSION,
            chars = raw.len(),
            "Judge completion"
        );
        ConsensusVerdict::parse_judge_output(&raw)
    }
}
