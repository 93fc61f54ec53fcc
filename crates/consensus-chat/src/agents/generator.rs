//! Persona response generator backed by rig agents.

use std::collections::HashMap;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use tracing::debug;

use coordination::{AgentDirectory, AgentId, AgentProfile, GenerationError, ResponseGenerator};

use crate::prompts;

/// Type alias for agents built from OpenAI-compatible endpoints.
pub type OaiAgent = Agent<openai::completion::CompletionModel>;

/// Build one persona agent: the profile's instruction as preamble, its model
/// as the request model.
pub fn build_persona(
    client: &openai::CompletionsClient,
    profile: &AgentProfile,
    temperature: f64,
) -> OaiAgent {
    client
        .agent(&profile.model)
        .name(profile.id.as_str())
        .description(&profile.description)
        .preamble(&profile.system_instruction)
        .temperature(temperature)
        .build()
}

/// One pre-built rig agent per directory entry.
pub struct RigResponseGenerator {
    agents: HashMap<AgentId, OaiAgent>,
}

impl RigResponseGenerator {
    pub fn new(
        client: &openai::CompletionsClient,
        directory: &AgentDirectory,
        temperature: f64,
    ) -> Self {
        let agents = directory
            .iter()
            .map(|profile| (profile.id.clone(), build_persona(client, profile, temperature)))
            .collect();
        Self { agents }
    }
}

#[async_trait]
impl ResponseGenerator for RigResponseGenerator {
    async fn generate(
        &self,
        agent: &AgentProfile,
        prompt: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError> {
        let persona = self
            .agents
            .get(&agent.id)
            .ok_or_else(|| GenerationError::UnknownAgent(agent.id.clone()))?;

        let request = prompts::persona_prompt(agent, prompt, context);
        let response: String = persona
            .prompt(request.as_str())
            .await
            .map_err(|e| GenerationError::Inference(e.to_string()))?;

        debug!(
            agent = %agent.id,
            model = %agent.model,
            refine = context.is_some(),
            chars = response.len(),
            "Persona completion"
        );

        if response.trim().is_empty() {
            return Ok(prompts::NO_RESPONSE.to_string());
        }
        Ok(response)
    }
}
