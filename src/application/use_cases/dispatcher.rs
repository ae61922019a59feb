//! Execution Dispatcher
//!
//! Submits a normalized query plus the table to the external agent under
//! three bounds: the agent's own reasoning is capped at
//! `config.max_iterations` steps, a parse failure is retried exactly once
//! with the same query (the agent's self-correction pass), and the whole
//! dispatch is cancelled at `config.timeout_secs`. A cancelled or failed
//! dispatch is a `Failed` outcome, never a hang and never a panic.
//!
//! The dispatcher does not classify: a successful dispatch comes back as
//! `Text` holding the raw response, for the result classifier to inspect.

use crate::domain::agent_config::AgentConfig;
use crate::domain::error::AppError;
use crate::domain::outcome::ExecutionOutcome;
use crate::domain::table::DataTable;
use crate::infrastructure::llm_clients::AgentClient;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Failure messages longer than this are truncated for display.
const MAX_REASON_LEN: usize = 200;

/// A normalized query paired with a read-only borrow of the session table.
pub struct ExecutionRequest<'a> {
    pub query: &'a str,
    pub table: &'a DataTable,
}

/// Dispatch one query to the agent and report the outcome.
///
/// Never returns an error: every failure mode is folded into
/// `ExecutionOutcome::Failed` with a stable, human-readable reason.
pub async fn execute(
    agent: &dyn AgentClient,
    config: &AgentConfig,
    req: ExecutionRequest<'_>,
) -> ExecutionOutcome {
    // "At most one retry" is the contract; a larger configured value is
    // clamped rather than honored.
    let mut retries_left = config.max_retries.min(1);
    let budget = Duration::from_secs(config.timeout_secs);

    loop {
        let attempt = timeout(budget, agent.run(config, req.query, req.table)).await;

        match attempt {
            Ok(Ok(raw)) => {
                debug!(query = req.query, "agent returned a response");
                return ExecutionOutcome::Text { text: raw };
            }
            Ok(Err(AppError::ParseError(msg))) if retries_left > 0 => {
                retries_left -= 1;
                warn!(
                    query = req.query,
                    error = %msg,
                    "agent response unparseable, retrying once"
                );
            }
            Ok(Err(err)) => {
                return ExecutionOutcome::Failed {
                    reason: failure_reason(&err),
                };
            }
            Err(_) => {
                warn!(
                    query = req.query,
                    timeout_secs = config.timeout_secs,
                    "dispatch timed out"
                );
                return ExecutionOutcome::Failed {
                    reason: "timeout".to_string(),
                };
            }
        }
    }
}

/// Map an agent error to the stable reason strings the UI keys off.
/// Network unavailability is kept distinct from logical query failure.
fn failure_reason(err: &AppError) -> String {
    let reason = match err {
        AppError::IterationLimit(_) => "iteration limit exceeded".to_string(),
        AppError::Timeout(_) => "timeout".to_string(),
        AppError::Unreachable(msg) => format!("unreachable: {}", msg),
        AppError::ParseError(msg) => format!("agent error: {}", msg),
        AppError::AgentError(msg) => format!("agent error: {}", msg),
        other => format!("agent error: {}", other),
    };
    truncate_reason(reason)
}

fn truncate_reason(reason: String) -> String {
    if reason.chars().count() <= MAX_REASON_LEN {
        return reason;
    }
    let cut: String = reason.chars().take(MAX_REASON_LEN).collect();
    format!("{}... (try a simpler query)", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_mapping() {
        assert_eq!(
            failure_reason(&AppError::IterationLimit("10 steps".to_string())),
            "iteration limit exceeded"
        );
        assert_eq!(
            failure_reason(&AppError::Timeout("60s".to_string())),
            "timeout"
        );
        assert_eq!(
            failure_reason(&AppError::Unreachable("dns".to_string())),
            "unreachable: dns"
        );
        assert_eq!(
            failure_reason(&AppError::AgentError("bad column".to_string())),
            "agent error: bad column"
        );
    }

    #[test]
    fn test_long_reasons_truncated() {
        let long = "x".repeat(500);
        let reason = failure_reason(&AppError::AgentError(long));
        assert!(reason.chars().count() < 300);
        assert!(reason.ends_with("(try a simpler query)"));
    }
}
