// ============================================================
// EXECUTION OUTCOMES
// ============================================================
// Tagged result of one query attempt, plus the analytics log entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classified result of one dispatched query, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Rectangular result with at least one data row
    Tabular {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Single numeric or short metric value
    Scalar { value: String },
    /// Free-form answer, also the fallback for ambiguous shapes
    Text { text: String },
    /// Terminal failure for this query; reason is human-readable
    Failed { reason: String },
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, ExecutionOutcome::Failed { .. })
    }

    /// Short label for analytics ("tabular", "scalar", "text", "failed")
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionOutcome::Tabular { .. } => "tabular",
            ExecutionOutcome::Scalar { .. } => "scalar",
            ExecutionOutcome::Text { .. } => "text",
            ExecutionOutcome::Failed { .. } => "failed",
        }
    }
}

/// One completed query attempt. Immutable once created; appended to the
/// session log on every attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub id: Uuid,
    pub raw_query: String,
    pub normalized_query: String,
    pub outcome_kind: String,
    pub succeeded: bool,
    pub timestamp: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn new(raw_query: &str, normalized_query: &str, outcome: &ExecutionOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_query: raw_query.to_string(),
            normalized_query: normalized_query.to_string(),
            outcome_kind: outcome.kind().to_string(),
            succeeded: outcome.succeeded(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_kind_labels() {
        let failed = ExecutionOutcome::Failed {
            reason: "timeout".to_string(),
        };
        assert_eq!(failed.kind(), "failed");
        assert!(!failed.succeeded());

        let scalar = ExecutionOutcome::Scalar {
            value: "42".to_string(),
        };
        assert_eq!(scalar.kind(), "scalar");
        assert!(scalar.succeeded());
    }

    #[test]
    fn test_log_entry_captures_outcome() {
        let outcome = ExecutionOutcome::Text {
            text: "hello".to_string(),
        };
        let entry = QueryLogEntry::new("raw", "normalized", &outcome);
        assert_eq!(entry.outcome_kind, "text");
        assert!(entry.succeeded);
    }
}
