//! Agent builders for the consensus debate.
//!
//! Every persona and the judge run against the same OpenAI-compatible client.
//! The `AgentFactory` ties them together using the client and `ChatConfig`.

pub mod generator;
pub mod judge;

use std::sync::Arc;

use anyhow::Result;
use rig::providers::openai;

use coordination::{ChatSession, DebateOrchestrator};

use crate::config::ChatConfig;
use generator::RigResponseGenerator;
use judge::RigConsensusJudge;

/// Factory that builds the generator, judge and orchestrator from a `ChatConfig`.
pub struct AgentFactory {
    pub client: openai::CompletionsClient,
    pub config: ChatConfig,
}

impl AgentFactory {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build one persona agent per directory entry.
    pub fn build_generator(&self) -> RigResponseGenerator {
        RigResponseGenerator::new(
            &self.client,
            &self.config.directory,
            self.config.endpoint.temperature,
        )
    }

    pub fn build_judge(&self) -> RigConsensusJudge {
        RigConsensusJudge::new(judge::build_judge(
            &self.client,
            &self.config.endpoint.judge_model,
            self.config.endpoint.judge_temperature,
            self.config.endpoint.structured_output,
        ))
    }

    pub fn build_orchestrator(&self) -> DebateOrchestrator {
        DebateOrchestrator::with_config(
            Arc::new(self.config.directory.clone()),
            Arc::new(self.build_generator()),
            Arc::new(self.build_judge()),
            self.config.debate.clone(),
        )
    }

    /// A fresh chat session over a new, empty conversation.
    pub fn build_session(&self) -> ChatSession {
        ChatSession::new(Arc::new(self.build_orchestrator()))
    }
}
