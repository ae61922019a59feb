//! Session-scoped analytics over query attempts.
//!
//! Every completed dispatch, success or failure, is appended here exactly
//! once. The log lives and dies with the session; nothing is persisted.

use crate::domain::outcome::QueryLogEntry;
use std::sync::{Arc, Mutex};

pub struct QueryTracker {
    entries: Vec<QueryLogEntry>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append one completed attempt. Append-only; entries are never edited.
    pub fn record(&mut self, entry: QueryLogEntry) {
        self.entries.push(entry);
    }

    /// Fraction of successful queries in [0, 1].
    ///
    /// Recomputed over the full log on every call rather than kept as a
    /// running counter, so it cannot drift. Empty log yields 0.0.
    pub fn success_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let successful = self.entries.iter().filter(|e| e.succeeded).count();
        successful as f64 / self.entries.len() as f64
    }

    pub fn total_queries(&self) -> usize {
        self.entries.len()
    }

    /// All entries in insertion order.
    pub fn history(&self) -> impl Iterator<Item = &QueryLogEntry> {
        self.entries.iter()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> &[QueryLogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Failed entries only, for debugging bad query phrasings.
    pub fn failures(&self) -> Vec<&QueryLogEntry> {
        self.entries.iter().filter(|e| !e.succeeded).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for QueryTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle the HTTP layer holds onto.
pub struct SharedQueryTracker {
    inner: Arc<Mutex<QueryTracker>>,
}

impl SharedQueryTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueryTracker::new())),
        }
    }

    pub fn record(&self, entry: QueryLogEntry) {
        self.inner.lock().unwrap().record(entry);
    }

    pub fn success_rate(&self) -> f64 {
        self.inner.lock().unwrap().success_rate()
    }

    pub fn total_queries(&self) -> usize {
        self.inner.lock().unwrap().total_queries()
    }

    pub fn history(&self) -> Vec<QueryLogEntry> {
        self.inner.lock().unwrap().history().cloned().collect()
    }

    pub fn recent(&self, n: usize) -> Vec<QueryLogEntry> {
        self.inner.lock().unwrap().recent(n).to_vec()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

impl Default for SharedQueryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SharedQueryTracker {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::ExecutionOutcome;

    fn entry(succeeded: bool) -> QueryLogEntry {
        let outcome = if succeeded {
            ExecutionOutcome::Text {
                text: "ok".to_string(),
            }
        } else {
            ExecutionOutcome::Failed {
                reason: "agent error: boom".to_string(),
            }
        };
        QueryLogEntry::new("raw", "normalized", &outcome)
    }

    #[test]
    fn test_empty_log_success_rate_is_zero() {
        let tracker = QueryTracker::new();
        assert_eq!(tracker.success_rate(), 0.0);
        assert_eq!(tracker.total_queries(), 0);
    }

    #[test]
    fn test_success_rate_half() {
        let mut tracker = QueryTracker::new();
        tracker.record(entry(true));
        tracker.record(entry(false));
        assert_eq!(tracker.success_rate(), 0.5);
    }

    #[test]
    fn test_history_preserves_insertion_order() {
        let mut tracker = QueryTracker::new();
        tracker.record(entry(true));
        tracker.record(entry(false));
        tracker.record(entry(true));

        let order: Vec<bool> = tracker.history().map(|e| e.succeeded).collect();
        assert_eq!(order, vec![true, false, true]);

        // The view is restartable.
        assert_eq!(tracker.history().count(), 3);
        assert_eq!(tracker.history().count(), 3);
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut tracker = QueryTracker::new();
        for i in 0..5 {
            tracker.record(entry(i % 2 == 0));
        }
        assert_eq!(tracker.recent(2).len(), 2);
        assert_eq!(tracker.recent(10).len(), 5);
    }

    #[test]
    fn test_failures_filtered() {
        let mut tracker = QueryTracker::new();
        tracker.record(entry(true));
        tracker.record(entry(false));
        assert_eq!(tracker.failures().len(), 1);
    }
}
