//! Debate orchestrator — drives the persona fan-out / judge round loop.
//!
//! Each round publishes a pending placeholder, fans out one generator call per
//! agent on a `JoinSet`, publishes the settled responses in directory order,
//! asks the judge, and either stops on consensus or folds the responses into
//! the context for the next round. The orchestrator never touches the store;
//! everything goes through a [`DebatePublisher`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

use super::consensus::ConsensusVerdict;
use super::errors::{DebateError, GenerationError, JudgeError};
use super::state::{AgentResponse, DebateStatus, Round};
use crate::agent_profile::{AgentDirectory, AgentProfile};

/// Configuration for the debate orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Maximum rounds before the debate ends as `failed`.
    pub max_rounds: u32,
    /// Per-agent call timeout. Unset means wait indefinitely.
    pub agent_timeout_secs: Option<u64>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            agent_timeout_secs: None,
        }
    }
}

impl DebateConfig {
    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout_secs.map(Duration::from_secs)
    }
}

/// Produces one persona's answer.
///
/// `context` is the folded transcript of the previous round, `None` in round 1.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        agent: &AgentProfile,
        prompt: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Decides whether a round's responses agree.
#[async_trait]
pub trait ConsensusJudge: Send + Sync {
    async fn judge(
        &self,
        prompt: &str,
        responses: &[AgentResponse],
    ) -> Result<ConsensusVerdict, JudgeError>;
}

/// Write path for debate progress. Round indexes are 0-based.
pub trait DebatePublisher: Send + Sync {
    fn round_added(&self, round: Round);
    fn round_responses_updated(&self, round_index: usize, responses: Vec<AgentResponse>);
    fn round_judged(&self, round_index: usize, verdict: ConsensusVerdict);
    fn status_changed(&self, status: DebateStatus, verdict: Option<ConsensusVerdict>);
}

/// Runs debates over a fixed agent directory.
#[derive(Clone)]
pub struct DebateOrchestrator {
    directory: Arc<AgentDirectory>,
    generator: Arc<dyn ResponseGenerator>,
    judge: Arc<dyn ConsensusJudge>,
    config: DebateConfig,
}

impl DebateOrchestrator {
    pub fn new(
        directory: Arc<AgentDirectory>,
        generator: Arc<dyn ResponseGenerator>,
        judge: Arc<dyn ConsensusJudge>,
    ) -> Self {
        Self::with_config(directory, generator, judge, DebateConfig::default())
    }

    pub fn with_config(
        directory: Arc<AgentDirectory>,
        generator: Arc<dyn ResponseGenerator>,
        judge: Arc<dyn ConsensusJudge>,
        config: DebateConfig,
    ) -> Self {
        Self {
            directory,
            generator,
            judge,
            config,
        }
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Run a full debate and return its terminal status.
    ///
    /// Never fails: unexpected errors publish `failed` with no verdict.
    pub async fn run_debate(
        &self,
        prompt: &str,
        publisher: &dyn DebatePublisher,
    ) -> DebateStatus {
        let started = Instant::now();
        match self.drive(prompt, publisher).await {
            Ok(status) => {
                info!(
                    %status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Debate finished"
                );
                status
            }
            Err(e) => {
                error!(error = %e, "Debate aborted");
                publisher.status_changed(DebateStatus::Failed, None);
                DebateStatus::Failed
            }
        }
    }

    async fn drive(
        &self,
        prompt: &str,
        publisher: &dyn DebatePublisher,
    ) -> Result<DebateStatus, DebateError> {
        if prompt.trim().is_empty() {
            return Err(DebateError::EmptyPrompt);
        }
        if self.config.max_rounds == 0 {
            return Err(DebateError::NoRounds);
        }

        let prompt: Arc<str> = Arc::from(prompt);
        let mut context: Option<Arc<str>> = None;
        let mut last_verdict = None;

        for round_number in 1..=self.config.max_rounds {
            let index = (round_number - 1) as usize;
            let started = Instant::now();
            info!(
                round = round_number,
                agents = self.directory.len(),
                "Starting debate round"
            );

            publisher.round_added(Round::pending(round_number, &self.directory));

            let responses = self
                .collect_responses(round_number, &prompt, context.clone())
                .await?;
            publisher.round_responses_updated(index, responses.clone());

            let verdict = self.evaluate(round_number, &prompt, &responses).await;
            publisher.round_judged(index, verdict.clone());
            info!(
                round = round_number,
                has_consensus = verdict.has_consensus,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Round judged"
            );

            if verdict.has_consensus {
                publisher.status_changed(DebateStatus::ConsensusReached, Some(verdict));
                return Ok(DebateStatus::ConsensusReached);
            }

            context = Some(Arc::from(fold_context(&responses)));
            last_verdict = Some(verdict);
        }

        publisher.status_changed(DebateStatus::Failed, last_verdict);
        Ok(DebateStatus::Failed)
    }

    /// Fan out one generator call per agent and wait for all of them.
    async fn collect_responses(
        &self,
        round: u32,
        prompt: &Arc<str>,
        context: Option<Arc<str>>,
    ) -> Result<Vec<AgentResponse>, DebateError> {
        let timeout = self.config.agent_timeout();
        let mut join_set: JoinSet<AgentResponse> = JoinSet::new();
        let mut slot_of: HashMap<task::Id, usize> = HashMap::new();

        for (index, agent) in self.directory.iter().enumerate() {
            let generator = Arc::clone(&self.generator);
            let agent = agent.clone();
            let prompt = Arc::clone(prompt);
            let context = context.clone();

            let handle = join_set.spawn(async move {
                let start = Instant::now();
                let result = call_generator(
                    generator.as_ref(),
                    &agent,
                    &prompt,
                    context.as_deref(),
                    timeout,
                )
                .await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match result {
                    Ok(text) => {
                        debug!(round, agent = %agent.id, elapsed_ms, "Agent responded");
                        AgentResponse::completed(agent.id.clone(), text)
                    }
                    Err(e) => {
                        warn!(
                            round,
                            agent = %agent.id,
                            elapsed_ms,
                            error = %e,
                            "Agent call failed"
                        );
                        AgentResponse::error_placeholder(&agent, &e.to_string())
                    }
                }
            });
            slot_of.insert(handle.id(), index);
        }

        let agents = self.directory.agents();
        let mut slots: Vec<Option<AgentResponse>> = vec![None; agents.len()];
        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, response)) => {
                    if let Some(&index) = slot_of.get(&id) {
                        slots[index] = Some(response);
                    }
                }
                Err(e) if e.is_panic() => {
                    let Some(&index) = slot_of.get(&e.id()) else {
                        return Err(DebateError::TaskLost(e.to_string()));
                    };
                    let agent = &agents[index];
                    warn!(round, agent = %agent.id, "Agent task panicked");
                    slots[index] = Some(AgentResponse::error_placeholder(
                        agent,
                        &GenerationError::Panicked.to_string(),
                    ));
                }
                Err(e) => return Err(DebateError::TaskLost(e.to_string())),
            }
        }

        slots
            .into_iter()
            .zip(agents)
            .map(|(slot, agent)| {
                slot.ok_or_else(|| DebateError::MissingResponse(agent.id.clone()))
            })
            .collect()
    }

    /// Ask the judge on its own task; a panic becomes an evaluation-error verdict.
    async fn evaluate(
        &self,
        round: u32,
        prompt: &Arc<str>,
        responses: &[AgentResponse],
    ) -> ConsensusVerdict {
        let judge = Arc::clone(&self.judge);
        let prompt = Arc::clone(prompt);
        let responses = responses.to_vec();
        let handle = tokio::spawn(async move { judge.judge(&prompt, &responses).await });

        let result = match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                warn!(round, "Consensus judge task panicked");
                Err(JudgeError::Panicked("judge panicked".into()))
            }
            Err(e) => Err(JudgeError::Panicked(e.to_string())),
        };

        match result {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(round, error = %e, "Consensus judge failed");
                ConsensusVerdict::evaluation_error(&e)
            }
        }
    }
}

async fn call_generator(
    generator: &dyn ResponseGenerator,
    agent: &AgentProfile,
    prompt: &str,
    context: Option<&str>,
    timeout: Option<Duration>,
) -> Result<String, GenerationError> {
    let call = generator.generate(agent, prompt, context);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| GenerationError::Timeout(limit))?,
        None => call.await,
    }
}

/// Fold a round's responses into the context for the next round.
///
/// `[Agent <id>]: <content>` per agent, in slot order, separated by a blank line.
pub fn fold_context(responses: &[AgentResponse]) -> String {
    responses
        .iter()
        .map(|r| format!("[Agent {}]: {}", r.agent_id, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_profile::AgentId;
    use std::sync::Mutex;

    struct EchoGenerator;

    #[async_trait]
    impl ResponseGenerator for EchoGenerator {
        async fn generate(
            &self,
            agent: &AgentProfile,
            _prompt: &str,
            context: Option<&str>,
        ) -> Result<String, GenerationError> {
            if agent.id.as_str() == "gpt" && context.is_none() {
                return Err(GenerationError::Inference("rate limited".into()));
            }
            Ok(format!("{} answer", agent.id))
        }
    }

    struct FixedJudge(Result<bool, ()>);

    #[async_trait]
    impl ConsensusJudge for FixedJudge {
        async fn judge(
            &self,
            _prompt: &str,
            _responses: &[AgentResponse],
        ) -> Result<ConsensusVerdict, JudgeError> {
            match self.0 {
                Ok(true) => Ok(ConsensusVerdict::reached("agree", Some("4".into()))),
                Ok(false) => Ok(ConsensusVerdict::not_reached("split", vec!["x".into()])),
                Err(()) => Err(JudgeError::EmptyResponse),
            }
        }
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl DebatePublisher for Log {
        fn round_added(&self, round: Round) {
            self.0.lock().unwrap().push(format!("round {}", round.round_number));
        }
        fn round_responses_updated(&self, round_index: usize, responses: Vec<AgentResponse>) {
            self.0
                .lock()
                .unwrap()
                .push(format!("responses {} x{}", round_index, responses.len()));
        }
        fn round_judged(&self, round_index: usize, verdict: ConsensusVerdict) {
            self.0
                .lock()
                .unwrap()
                .push(format!("judged {} {}", round_index, verdict.has_consensus));
        }
        fn status_changed(&self, status: DebateStatus, verdict: Option<ConsensusVerdict>) {
            self.0
                .lock()
                .unwrap()
                .push(format!("status {} {}", status, verdict.is_some()));
        }
    }

    fn orchestrator(judge: FixedJudge, max_rounds: u32) -> DebateOrchestrator {
        DebateOrchestrator::with_config(
            Arc::new(AgentDirectory::builtin()),
            Arc::new(EchoGenerator),
            Arc::new(judge),
            DebateConfig {
                max_rounds,
                agent_timeout_secs: None,
            },
        )
    }

    #[test]
    fn test_default_config() {
        let config = DebateConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert!(config.agent_timeout().is_none());
    }

    #[test]
    fn test_fold_context_format() {
        let responses = vec![
            AgentResponse::completed(AgentId::new("gemini"), "4"),
            AgentResponse::completed(AgentId::new("gpt"), "Four."),
        ];
        assert_eq!(
            fold_context(&responses),
            "[Agent gemini]: 4\n\n[Agent gpt]: Four."
        );
    }

    #[tokio::test]
    async fn test_publish_sequence_on_consensus() {
        let log = Log::default();
        let status = orchestrator(FixedJudge(Ok(true)), 3)
            .run_debate("What is 2+2?", &log)
            .await;
        assert_eq!(status, DebateStatus::ConsensusReached);
        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                "round 1",
                "responses 0 x3",
                "judged 0 true",
                "status consensus_reached true"
            ]
        );
    }

    #[tokio::test]
    async fn test_round_cap_publishes_failed_with_last_verdict() {
        let log = Log::default();
        let status = orchestrator(FixedJudge(Ok(false)), 2)
            .run_debate("Is a hot dog a sandwich?", &log)
            .await;
        assert_eq!(status, DebateStatus::Failed);
        let log = log.0.lock().unwrap();
        assert_eq!(log.len(), 7);
        assert_eq!(log.last().unwrap(), "status failed true");
    }

    #[tokio::test]
    async fn test_judge_failure_never_reaches_consensus() {
        let log = Log::default();
        let status = orchestrator(FixedJudge(Err(())), 1)
            .run_debate("anything", &log)
            .await;
        assert_eq!(status, DebateStatus::Failed);
        assert!(log.0.lock().unwrap().contains(&"judged 0 false".to_string()));
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_without_rounds() {
        let log = Log::default();
        let status = orchestrator(FixedJudge(Ok(true)), 3)
            .run_debate("   ", &log)
            .await;
        assert_eq!(status, DebateStatus::Failed);
        assert_eq!(*log.0.lock().unwrap(), vec!["status failed false"]);
    }

    #[tokio::test]
    async fn test_zero_round_cap_fails() {
        let log = Log::default();
        let status = orchestrator(FixedJudge(Ok(true)), 0)
            .run_debate("hi", &log)
            .await;
        assert_eq!(status, DebateStatus::Failed);
        assert_eq!(*log.0.lock().unwrap(), vec!["status failed false"]);
    }

    struct PanickingGenerator;

    #[async_trait]
    impl ResponseGenerator for PanickingGenerator {
        async fn generate(
            &self,
            agent: &AgentProfile,
            _prompt: &str,
            _context: Option<&str>,
        ) -> Result<String, GenerationError> {
            if agent.id.as_str() == "claude" {
                panic!("persona backend blew up");
            }
            Ok("4".into())
        }
    }

    #[tokio::test]
    async fn test_panicking_agent_gets_placeholder() {
        let orch = DebateOrchestrator::new(
            Arc::new(AgentDirectory::builtin()),
            Arc::new(PanickingGenerator),
            Arc::new(FixedJudge(Ok(true))),
        );
        let responses = orch
            .collect_responses(1, &Arc::from("q"), None)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].content, "4");
        assert!(responses[2].is_error());
        assert!(responses[2].content.contains("generator panicked"));
    }

    struct PanickingJudge;

    #[async_trait]
    impl ConsensusJudge for PanickingJudge {
        async fn judge(
            &self,
            _prompt: &str,
            _responses: &[AgentResponse],
        ) -> Result<ConsensusVerdict, JudgeError> {
            panic!("judge backend blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_judge_ends_debate_failed() {
        let log = Log::default();
        let orch = DebateOrchestrator::with_config(
            Arc::new(AgentDirectory::builtin()),
            Arc::new(EchoGenerator),
            Arc::new(PanickingJudge),
            DebateConfig {
                max_rounds: 2,
                agent_timeout_secs: None,
            },
        );
        let status = orch.run_debate("What is 2+2?", &log).await;
        assert_eq!(status, DebateStatus::Failed);

        let log = log.0.lock().unwrap();
        assert_eq!(log.len(), 7);
        assert_eq!(log[2], "judged 0 false");
        assert_eq!(log[5], "judged 1 false");
        assert_eq!(log.last().unwrap(), "status failed true");
    }

    #[tokio::test]
    async fn test_panicking_judge_yields_evaluation_error() {
        let orch = DebateOrchestrator::new(
            Arc::new(AgentDirectory::builtin()),
            Arc::new(EchoGenerator),
            Arc::new(PanickingJudge),
        );
        let responses = vec![AgentResponse::completed(AgentId::new("gemini"), "4")];
        let verdict = orch.evaluate(1, &Arc::from("q"), &responses).await;
        assert!(!verdict.has_consensus);
        assert!(verdict.is_evaluation_error());
        assert!(verdict.summary.contains("judge panicked"));
    }

    #[tokio::test]
    async fn test_failing_agent_gets_placeholder() {
        let orch = orchestrator(FixedJudge(Ok(true)), 1);
        let responses = orch
            .collect_responses(1, &Arc::from("q"), None)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert!(!responses[0].is_error());
        assert!(responses[1].is_error());
        assert!(responses[1].content.contains("rate limited"));
        assert!(!responses[2].is_error());
    }
}
