use serde::{Deserialize, Serialize};

/// Configuration for the external reasoning agent.
///
/// Everything here is externally supplied (config file or environment);
/// nothing in the pipeline hard-codes a provider or credential.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    /// OpenAI-compatible chat completions endpoint base URL.
    pub base_url: String,
    /// Model identifier passed through to the provider.
    pub model: String,
    pub api_key: Option<String>,
    /// Upper bound on the agent's reasoning steps for one query.
    pub max_iterations: u32,
    /// Extra attempts after an agent parse failure. One is the contract;
    /// anything higher is clamped by the dispatcher.
    pub max_retries: u32,
    /// Wall-clock bound on a single dispatch, in seconds.
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            max_iterations: 10,
            max_retries: 1,
            timeout_secs: 60,
        }
    }
}
