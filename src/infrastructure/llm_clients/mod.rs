pub mod openai;

use crate::domain::agent_config::AgentConfig;
use crate::domain::error::Result;
use crate::domain::table::DataTable;
use async_trait::async_trait;

/// Capability boundary to the external reasoning agent.
///
/// The agent is opaque, non-deterministic, and network-dependent; the
/// pipeline and its tests depend only on this contract. Errors carry the
/// failure class the dispatcher needs: `ParseError` is retryable once,
/// `Unreachable` means the provider could not be reached at all,
/// `IterationLimit` means the reasoning budget ran out, and `AgentError`
/// is a logical failure reported by the agent itself.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn run(&self, config: &AgentConfig, query: &str, table: &DataTable) -> Result<String>;
}
