//! Analysis session
//!
//! One session owns one loaded table, one query log, and a handle to the
//! agent. It is created when a CSV is uploaded and dropped when the user is
//! done; the log never outlives it. `ask` is the whole pipeline:
//! normalize, dispatch, classify, record.

use crate::application::use_cases::dispatcher::{self, ExecutionRequest};
use crate::application::use_cases::query_normalizer::normalize;
use crate::application::use_cases::query_tracker::SharedQueryTracker;
use crate::application::use_cases::result_classifier::classify_outcome;
use crate::domain::agent_config::AgentConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::outcome::{ExecutionOutcome, QueryLogEntry};
use crate::domain::table::{DataTable, TableSummary};
use crate::infrastructure::llm_clients::AgentClient;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct AnalysisSession {
    id: Uuid,
    table: DataTable,
    tracker: SharedQueryTracker,
    agent: Arc<dyn AgentClient>,
    config: AgentConfig,
}

impl AnalysisSession {
    pub fn new(table: DataTable, agent: Arc<dyn AgentClient>, config: AgentConfig) -> Result<Self> {
        table.validate().map_err(AppError::ValidationError)?;
        let session = Self {
            id: Uuid::new_v4(),
            table,
            tracker: SharedQueryTracker::new(),
            agent,
            config,
        };
        info!(
            session_id = %session.id,
            rows = session.table.num_rows(),
            columns = session.table.num_columns(),
            "session created"
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn summary(&self) -> TableSummary {
        self.table.summary()
    }

    pub fn tracker(&self) -> &SharedQueryTracker {
        &self.tracker
    }

    /// Run one question through the pipeline.
    ///
    /// Every completed attempt, including timeouts and agent failures,
    /// produces exactly one log entry. Only an empty question is rejected
    /// before dispatch and leaves no trace in the log.
    pub async fn ask(&self, raw_query: &str) -> Result<ExecutionOutcome> {
        if raw_query.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question must not be empty".to_string(),
            ));
        }

        let normalized = normalize(raw_query);
        if normalized != raw_query.trim() {
            info!(raw = raw_query, normalized = %normalized, "query rewritten");
        }

        let request = ExecutionRequest {
            query: &normalized,
            table: &self.table,
        };
        let dispatched = dispatcher::execute(self.agent.as_ref(), &self.config, request).await;
        let outcome = classify_outcome(dispatched);

        self.tracker
            .record(QueryLogEntry::new(raw_query, &normalized, &outcome));
        info!(
            session_id = %self.id,
            kind = outcome.kind(),
            success_rate = self.tracker.success_rate(),
            "query completed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table() -> DataTable {
        DataTable::new(
            vec!["employee_name".to_string(), "department".to_string()],
            vec![
                vec!["Alice".to_string(), "Engineering".to_string()],
                vec!["Bob".to_string(), "Sales".to_string()],
            ],
        )
    }

    fn config() -> AgentConfig {
        AgentConfig {
            timeout_secs: 1,
            ..AgentConfig::default()
        }
    }

    /// Agent that always returns the same canned response.
    struct CannedAgent {
        response: String,
    }

    #[async_trait]
    impl AgentClient for CannedAgent {
        async fn run(&self, _: &AgentConfig, _: &str, _: &DataTable) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    /// Agent that fails to parse once, then succeeds.
    struct FlakyAgent {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentClient for FlakyAgent {
        async fn run(&self, _: &AgentConfig, _: &str, _: &DataTable) -> Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::ParseError("no final answer".to_string()))
            } else {
                Ok("42".to_string())
            }
        }
    }

    /// Agent that always fails to parse.
    struct BrokenAgent {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentClient for BrokenAgent {
        async fn run(&self, _: &AgentConfig, _: &str, _: &DataTable) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::ParseError("garbled".to_string()))
        }
    }

    /// Agent that never answers within any reasonable timeout.
    struct HangingAgent;

    #[async_trait]
    impl AgentClient for HangingAgent {
        async fn run(&self, _: &AgentConfig, _: &str, _: &DataTable) -> Result<String> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            unreachable!("sleep outlives every test timeout")
        }
    }

    /// Agent that reports a logical error.
    struct ErroringAgent;

    #[async_trait]
    impl AgentClient for ErroringAgent {
        async fn run(&self, _: &AgentConfig, _: &str, _: &DataTable) -> Result<String> {
            Err(AppError::AgentError("column not found".to_string()))
        }
    }

    #[tokio::test]
    async fn test_grouped_count_yields_tabular_and_logged_success() {
        let canned = "\
| department | count |
|------------|-------|
| Engineering | 3 |
| Sales | 2 |
| Marketing | 1 |
| Support | 4 |
| Finance | 2 |";
        let session = AnalysisSession::new(
            table(),
            Arc::new(CannedAgent {
                response: canned.to_string(),
            }),
            config(),
        )
        .unwrap();

        let outcome = session
            .ask("how many employees in each department")
            .await
            .unwrap();

        match &outcome {
            ExecutionOutcome::Tabular { rows, .. } => assert_eq!(rows.len(), 5),
            other => panic!("expected tabular, got {:?}", other),
        }

        let history = session.tracker().history();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].normalized_query,
            "count employees in each department"
        );
        assert!(history[0].succeeded);
    }

    #[tokio::test]
    async fn test_single_retry_recovers_from_parse_error() {
        let session = AnalysisSession::new(
            table(),
            Arc::new(FlakyAgent {
                calls: AtomicUsize::new(0),
            }),
            config(),
        )
        .unwrap();

        let outcome = session.ask("how many rows").await.unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Scalar {
                value: "42".to_string()
            }
        );
        assert_eq!(session.tracker().success_rate(), 1.0);
    }

    #[tokio::test]
    async fn test_persistent_parse_error_fails_after_two_attempts() {
        let agent = Arc::new(BrokenAgent {
            calls: AtomicUsize::new(0),
        });
        let session = AnalysisSession::new(table(), agent.clone(), config()).unwrap();

        let outcome = session.ask("how many rows").await.unwrap();
        match &outcome {
            ExecutionOutcome::Failed { reason } => {
                assert!(reason.starts_with("agent error:"), "reason: {}", reason);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(agent.calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.tracker().success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_timeout_fails_and_logs_exactly_one_entry() {
        let session = AnalysisSession::new(table(), Arc::new(HangingAgent), config()).unwrap();

        let outcome = session.ask("anything").await.unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                reason: "timeout".to_string()
            }
        );
        assert_eq!(session.tracker().total_queries(), 1);
        let history = session.tracker().history();
        assert!(!history[0].succeeded);
    }

    #[tokio::test]
    async fn test_unmatched_query_passes_through_and_agent_error_is_logged() {
        let session = AnalysisSession::new(table(), Arc::new(ErroringAgent), config()).unwrap();

        let outcome = session.ask("xyzzy").await.unwrap();
        match &outcome {
            ExecutionOutcome::Failed { reason } => {
                assert!(reason.starts_with("agent error:"));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let history = session.tracker().history();
        assert_eq!(history[0].normalized_query, "xyzzy");
        assert!(!history[0].succeeded);
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_log_entry() {
        let session = AnalysisSession::new(
            table(),
            Arc::new(CannedAgent {
                response: "ok".to_string(),
            }),
            config(),
        )
        .unwrap();

        assert!(session.ask("   ").await.is_err());
        assert_eq!(session.tracker().total_queries(), 0);
    }

    #[tokio::test]
    async fn test_success_rate_over_mixed_outcomes() {
        let session = AnalysisSession::new(
            table(),
            Arc::new(CannedAgent {
                response: "plain text answer".to_string(),
            }),
            config(),
        )
        .unwrap();
        session.ask("describe the data").await.unwrap();
        assert_eq!(session.tracker().success_rate(), 1.0);

        let failing = AnalysisSession::new(table(), Arc::new(ErroringAgent), config()).unwrap();
        failing.ask("q1").await.unwrap();
        assert_eq!(failing.tracker().success_rate(), 0.0);
    }

    #[test]
    fn test_session_rejects_empty_table() {
        let empty = DataTable::new(vec!["a".to_string()], vec![]);
        let result = AnalysisSession::new(
            empty,
            Arc::new(CannedAgent {
                response: "ok".to_string(),
            }),
            config(),
        );
        assert!(result.is_err());
    }
}
