//! Prompt templates for persona refinement and consensus judging.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever template content changes,
//! so a logged verdict can be traced back to the wording that produced it.

use coordination::{AgentProfile, AgentResponse};

/// Prompt version. Bump on any template change.
pub const PROMPT_VERSION: &str = "1.0.0";

/// Stand-in for an empty persona completion.
pub const NO_RESPONSE: &str = "No response generated.";

/// Judge preamble. The per-round task goes in the prompt itself.
pub const JUDGE_PREAMBLE: &str = "\
You are the Consensus Judge. You compare answers from several AI models to the \
same question and decide whether they agree. Respond only with a JSON object.";

/// Prompt for one persona call. Round 1 sends the user prompt unchanged.
pub fn persona_prompt(agent: &AgentProfile, prompt: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => refinement_prompt(agent, prompt, context),
        None => prompt.to_string(),
    }
}

/// Refinement prompt for rounds after the first.
pub fn refinement_prompt(agent: &AgentProfile, prompt: &str, context: &str) -> String {
    format!(
        "\
ORIGINAL USER PROMPT: \"{prompt}\"

CONTEXT FROM PREVIOUS ROUND (Other agents' responses):
{context}

INSTRUCTIONS:
Based on the original prompt and the perspectives of other agents above, provide your REFINED answer.
- If you agree with others, synthesize the best parts.
- If you disagree, explain why you are correct and they might be wrong.
- Maintain your persona ({name}).
",
        name = agent.name,
    )
}

/// Consensus-judge prompt listing every response of the round.
pub fn judge_prompt(prompt: &str, responses: &[AgentResponse]) -> String {
    let inputs = responses
        .iter()
        .map(|r| format!("Model {} says:\n{}\n---\n", r.agent_id, r.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\
You are the Consensus Judge.
User Prompt: \"{prompt}\"

The following are responses from different AI models:
{inputs}

Your Task:
1. Determine if the models broadly agree on the core answer (Consensus: true/false). Minor phrasing differences do not count as disagreement.
2. If they agree, provide a synthesized \"finalAnswer\" that combines the best clarity of all.
3. If they DISAGREE on facts or logic, list the \"disagreements\".
4. Provide a short \"summary\" of the situation (e.g., \"All models agree that X\" or \"Models dispute the value of Y\").

Respond in JSON format with the keys \"hasConsensus\" and \"summary\" (required), \
\"finalAnswer\" and \"disagreements\" (optional).
"
    )
}
