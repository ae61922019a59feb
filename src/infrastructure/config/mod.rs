use crate::domain::agent_config::AgentConfig;
use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Full service configuration: agent settings plus the HTTP bind address.
///
/// Sources, later ones winning: built-in defaults, `tabletalk.toml` in the
/// working directory, then `TABLETALK_`-prefixed environment variables
/// (e.g. `TABLETALK_API_KEY`, `TABLETALK_MODEL`, `TABLETALK_TIMEOUT_SECS`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(flatten)]
    pub agent: AgentConfig,
    pub bind_host: String,
    pub bind_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            bind_host: "127.0.0.1".to_string(),
            bind_port: 3001,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("tabletalk.toml"))
            .merge(Env::prefixed("TABLETALK_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.max_retries, 1);
        assert!(config.agent.timeout_secs > 0);
        assert_eq!(config.bind_port, 3001);
    }
}
