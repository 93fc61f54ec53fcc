use anyhow::{bail, Context, Result};
use coordination::{AgentDirectory, AgentProfile, DebateConfig};
use rig::providers::openai;
use serde::Deserialize;
use std::path::Path;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_JUDGE_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_JUDGE_TEMPERATURE: f64 = 0.2;

/// API key variables, in lookup order.
const API_KEY_VARS: [&str; 3] = ["CONSENSUS_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Inference endpoint shared by every persona and the judge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Model used for the consensus judge.
    pub judge_model: String,
    /// Persona sampling temperature.
    pub temperature: f64,
    pub judge_temperature: f64,
    /// Send the verdict JSON schema as `response_format`.
    pub structured_output: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.into(),
            api_key: None,
            judge_model: DEFAULT_JUDGE_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            judge_temperature: DEFAULT_JUDGE_TEMPERATURE,
            structured_output: true,
        }
    }
}

/// On-disk TOML layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint: EndpointConfig,
    pub debate: DebateConfig,
    /// Replaces the built-in directory when non-empty.
    pub agents: Vec<AgentProfile>,
}

/// Top-level chat configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: EndpointConfig,
    pub debate: DebateConfig,
    pub directory: AgentDirectory,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            debate: DebateConfig::default(),
            directory: AgentDirectory::builtin(),
        }
    }
}

impl ChatConfig {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw).context("Failed to parse TOML")?;
        let directory = if file.agents.is_empty() {
            AgentDirectory::builtin()
        } else {
            AgentDirectory::new(file.agents).context("Invalid [[agents]] table")?
        };
        Ok(Self {
            endpoint: file.endpoint,
            debate: file.debate,
            directory,
        })
    }

    /// Apply `CONSENSUS_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CONSENSUS_BASE_URL") {
            self.endpoint.url = url;
        }
        if let Some(model) = lookup("CONSENSUS_JUDGE_MODEL") {
            self.endpoint.judge_model = model;
        }
        if let Some(key) = API_KEY_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()))
        {
            self.endpoint.api_key = Some(key);
        }
        if let Some(raw) = lookup("CONSENSUS_MAX_ROUNDS") {
            self.debate.max_rounds = raw
                .trim()
                .parse()
                .with_context(|| format!("CONSENSUS_MAX_ROUNDS is not a number: {raw}"))?;
        }
        if let Some(raw) = lookup("CONSENSUS_AGENT_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("CONSENSUS_AGENT_TIMEOUT_SECS is not a number: {raw}"))?;
            self.debate.agent_timeout_secs = (secs > 0).then_some(secs);
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        match self.endpoint.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("No API key: set CONSENSUS_API_KEY (or GEMINI_API_KEY / API_KEY)"),
        }
    }

    /// Build the rig client for the configured endpoint.
    pub fn build_client(&self) -> Result<openai::CompletionsClient> {
        openai::CompletionsClient::builder()
            .api_key(self.require_api_key()?)
            .base_url(&self.endpoint.url)
            .build()
            .with_context(|| format!("Failed to build client for {}", self.endpoint.url))
    }
}

/// Check if the inference endpoint is reachable (GET /models).
pub async fn check_endpoint(url: &str, api_key: Option<&str>) -> bool {
    let models_url = format!("{}/models", url.trim_end_matches('/'));
    let mut request = reqwest::Client::new()
        .get(&models_url)
        .timeout(std::time::Duration::from_secs(5));
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    match request.send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.endpoint.url, DEFAULT_BASE_URL);
        assert_eq!(config.endpoint.judge_model, "gemini-3-pro-preview");
        assert_eq!(config.debate.max_rounds, 3);
        assert!(config.debate.agent_timeout_secs.is_none());
        assert_eq!(config.directory.len(), 3);
        assert!(config.endpoint.structured_output);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ChatConfig::from_toml_str("").unwrap();
        assert_eq!(config.endpoint.url, DEFAULT_BASE_URL);
        assert_eq!(config.directory, AgentDirectory::builtin());
    }

    #[test]
    fn test_toml_sections() {
        let config = ChatConfig::from_toml_str(
            r#"
            [endpoint]
            url = "http://localhost:8080/v1"
            judge_model = "local-judge"
            judge_temperature = 0.0

            [debate]
            max_rounds = 5
            agent_timeout_secs = 30

            [[agents]]
            id = "alpha"
            name = "Alpha"
            system_instruction = "You are Alpha."
            model = "local-a"

            [[agents]]
            id = "beta"
            name = "Beta"
            system_instruction = "You are Beta."
            model = "local-b"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.url, "http://localhost:8080/v1");
        assert_eq!(config.endpoint.judge_model, "local-judge");
        assert_eq!(config.endpoint.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.debate.max_rounds, 5);
        assert_eq!(config.debate.agent_timeout_secs, Some(30));
        let ids: Vec<String> = config.directory.ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_duplicate_agents_rejected() {
        let err = ChatConfig::from_toml_str(
            r#"
            [[agents]]
            id = "a"
            name = "A"
            system_instruction = "x"
            model = "m"

            [[agents]]
            id = "a"
            name = "A again"
            system_instruction = "y"
            model = "m"
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("duplicate agent id"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ChatConfig::default();
        config
            .apply_overrides(env(&[
                ("CONSENSUS_BASE_URL", "http://proxy:8317/v1"),
                ("CONSENSUS_MAX_ROUNDS", "4"),
                ("CONSENSUS_AGENT_TIMEOUT_SECS", "20"),
                ("CONSENSUS_JUDGE_MODEL", "judge-x"),
            ]))
            .unwrap();
        assert_eq!(config.endpoint.url, "http://proxy:8317/v1");
        assert_eq!(config.endpoint.judge_model, "judge-x");
        assert_eq!(config.debate.max_rounds, 4);
        assert_eq!(config.debate.agent_timeout_secs, Some(20));
    }

    #[test]
    fn test_zero_timeout_means_unset() {
        let mut config = ChatConfig::default();
        config.debate.agent_timeout_secs = Some(10);
        config
            .apply_overrides(env(&[("CONSENSUS_AGENT_TIMEOUT_SECS", "0")]))
            .unwrap();
        assert!(config.debate.agent_timeout_secs.is_none());
    }

    #[test]
    fn test_api_key_fallback_order() {
        let mut config = ChatConfig::default();
        config
            .apply_overrides(env(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]))
            .unwrap();
        assert_eq!(config.require_api_key().unwrap(), "gemini");

        let mut config = ChatConfig::default();
        config
            .apply_overrides(env(&[("CONSENSUS_API_KEY", "  "), ("API_KEY", "generic")]))
            .unwrap();
        assert_eq!(config.require_api_key().unwrap(), "generic");
    }

    #[test]
    fn test_missing_api_key() {
        let config = ChatConfig::default();
        assert!(config.require_api_key().is_err());
        assert!(config.build_client().is_err());
    }

    #[test]
    fn test_bad_max_rounds_rejected() {
        let mut config = ChatConfig::default();
        let err = config
            .apply_overrides(env(&[("CONSENSUS_MAX_ROUNDS", "three")]))
            .unwrap_err();
        assert!(err.to_string().contains("CONSENSUS_MAX_ROUNDS"));
    }
}
