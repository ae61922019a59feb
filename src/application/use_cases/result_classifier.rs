//! Result Classifier
//!
//! Inspects the raw text an agent returns and labels it for presentation:
//! a rectangular table becomes `Tabular`, a lone numeric value becomes
//! `Scalar`, and everything else falls back to `Text`.
//!
//! Agent output is inherently unstructured, so this is a best-effort shape
//! heuristic. A misread (say, a one-row table rendered as text) is an
//! accepted bounded limitation; ambiguity always resolves toward `Text`,
//! never toward a failure. A `Failed` outcome from the dispatcher is passed
//! through untouched.

use crate::domain::outcome::ExecutionOutcome;
use crate::infrastructure::response::clean_agent_response;

/// Classify a raw agent response into a presentation variant.
/// Only ever produces a success variant; failures never enter here.
pub fn classify(response: &str) -> ExecutionOutcome {
    let cleaned = clean_agent_response(response);

    if let Some((columns, rows)) = parse_table(&cleaned) {
        return ExecutionOutcome::Tabular { columns, rows };
    }

    if let Some(value) = parse_scalar(&cleaned) {
        return ExecutionOutcome::Scalar { value };
    }

    ExecutionOutcome::Text { text: cleaned }
}

/// Pass a dispatcher outcome through classification. `Failed` is returned
/// unchanged; a success is reclassified from its raw text.
pub fn classify_outcome(outcome: ExecutionOutcome) -> ExecutionOutcome {
    match outcome {
        ExecutionOutcome::Failed { .. } => outcome,
        ExecutionOutcome::Text { text } => classify(&text),
        other => other,
    }
}

/// Try to read the response as a rectangular table with at least one data
/// row. Handles markdown pipe tables and tab-separated blocks.
fn parse_table(text: &str) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    if lines.iter().all(|l| l.contains('|')) {
        return parse_delimited(&lines, '|');
    }
    if lines.iter().all(|l| l.contains('\t')) {
        return parse_delimited(&lines, '\t');
    }

    None
}

fn parse_delimited(lines: &[&str], delimiter: char) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut parsed: Vec<Vec<String>> = Vec::new();

    for line in lines {
        // Markdown separator rows (|---|---|) carry no data
        if is_separator_row(line) {
            continue;
        }
        let cells: Vec<String> = line
            .trim()
            .trim_matches(delimiter)
            .split(delimiter)
            .map(|c| c.trim().to_string())
            .collect();
        parsed.push(cells);
    }

    if parsed.len() < 2 {
        return None;
    }

    // Rectangular check: every row must match the header width
    let width = parsed[0].len();
    if width == 0 || parsed.iter().any(|row| row.len() != width) {
        return None;
    }

    let columns = parsed.remove(0);
    Some((columns, parsed))
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c == '-' || c == '|' || c == ':' || c == ' ' || c == '=')
        && trimmed.contains('-')
}

/// A scalar is a single line holding one numeric value, possibly decorated
/// with currency, percent, or thousands separators.
fn parse_scalar(text: &str) -> Option<String> {
    if text.lines().count() != 1 {
        return None;
    }
    let line = text.trim();
    if line.is_empty() || line.len() > 40 {
        return None;
    }

    let stripped: String = line
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | '€' | '£' | ' '))
        .collect();
    if stripped.parse::<f64>().is_ok() {
        return Some(line.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_table_classified_tabular() {
        let response = "\
| name | salary |
|------|--------|
| Alice | 90000 |
| Bob | 80000 |";
        match classify(response) {
            ExecutionOutcome::Tabular { columns, rows } => {
                assert_eq!(columns, vec!["name", "salary"]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0], vec!["Alice", "90000"]);
            }
            other => panic!("expected tabular, got {:?}", other),
        }
    }

    #[test]
    fn test_tab_separated_table() {
        let response = "name\tage\nAlice\t30\nBob\t25";
        match classify(response) {
            ExecutionOutcome::Tabular { columns, rows } => {
                assert_eq!(columns, vec!["name", "age"]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("expected tabular, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_scalar() {
        assert_eq!(
            classify("81266.67"),
            ExecutionOutcome::Scalar {
                value: "81266.67".to_string()
            }
        );
        assert_eq!(
            classify("$1,250,000"),
            ExecutionOutcome::Scalar {
                value: "$1,250,000".to_string()
            }
        );
    }

    #[test]
    fn test_prose_falls_back_to_text() {
        let response = "The dataset contains information about employees.";
        match classify(response) {
            ExecutionOutcome::Text { text } => {
                assert!(text.starts_with("The dataset"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_table_is_text_not_error() {
        // Inconsistent widths: conservative fallback, never a failure
        let response = "a | b\n1 | 2 | 3";
        assert!(matches!(classify(response), ExecutionOutcome::Text { .. }));
    }

    #[test]
    fn test_think_tags_stripped_before_classification() {
        let response = "<think>counting rows</think>42";
        assert_eq!(
            classify(response),
            ExecutionOutcome::Scalar {
                value: "42".to_string()
            }
        );
    }

    #[test]
    fn test_failed_outcome_passes_through() {
        let failed = ExecutionOutcome::Failed {
            reason: "timeout".to_string(),
        };
        assert_eq!(classify_outcome(failed.clone()), failed);
    }
}
