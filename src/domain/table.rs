// ============================================================
// TABLE TYPES
// ============================================================
// In-memory representation of a loaded CSV dataset

use serde::{Deserialize, Serialize};

/// A loaded tabular dataset. Read-only for the lifetime of a session;
/// the pipeline borrows it, never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTable {
    /// Normalized column names (lowercase, underscores)
    pub columns: Vec<String>,

    /// Row values, one Vec per row, aligned with `columns`
    pub rows: Vec<Vec<String>>,
}

/// Basic shape information about a table, for display and prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: Vec<String>,
}

impl DataTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// First `n` rows, for prompt context and UI previews
    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        let end = n.min(self.rows.len());
        &self.rows[..end]
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            num_rows: self.num_rows(),
            num_columns: self.num_columns(),
            columns: self.columns.clone(),
        }
    }

    /// Check the table is usable for analysis.
    /// Rejects empty tables, header-only files, and all-blank content.
    pub fn validate(&self) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("No columns found".to_string());
        }
        if self.rows.is_empty() {
            return Err("Table has no rows".to_string());
        }
        let all_blank = self
            .rows
            .iter()
            .all(|row| row.iter().all(|v| v.trim().is_empty()));
        if all_blank {
            return Err("All values are blank".to_string());
        }
        Ok(())
    }
}

/// Normalize a header to a canonical form: trimmed, lowercased,
/// whitespace replaced with underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                '_'
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("First Name"), "first_name");
        assert_eq!(normalize_column_name("  Salary  "), "salary");
        assert_eq!(normalize_column_name("Performance Score"), "performance_score");
    }

    #[test]
    fn test_validate_rejects_empty() {
        let table = DataTable::new(vec!["a".to_string()], vec![]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_all_blank() {
        let table = DataTable::new(
            vec!["a".to_string()],
            vec![vec![" ".to_string()], vec!["".to_string()]],
        );
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_preview_bounded_by_len() {
        let table = DataTable::new(vec!["a".to_string()], vec![vec!["1".to_string()]]);
        assert_eq!(table.preview(5).len(), 1);
    }
}
