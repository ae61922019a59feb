// ============================================================
// CSV LOADER
// ============================================================
// Decode uploaded bytes with a fixed list of encoding attempts,
// parse them as CSV, and normalize the headers

use crate::domain::error::{AppError, Result};
use crate::domain::table::{normalize_column_name, DataTable};
use csv::{ReaderBuilder, Trim};
use encoding_rs::Encoding;
use tracing::debug;

/// Encodings tried in order. The first clean decode wins.
/// encoding_rs resolves the latin-1 and iso-8859-1 labels to windows-1252,
/// which matches how uploads produced by those encodings actually decode.
const ENCODING_LABELS: &[&str] = &["utf-8", "latin1", "iso-8859-1", "windows-1252"];

/// Load raw uploaded bytes into a validated table.
pub fn load_table(bytes: &[u8]) -> Result<DataTable> {
    let content = decode(bytes)?;
    let table = parse_content(&content)?;
    table.validate().map_err(AppError::LoadError)?;
    Ok(table)
}

/// Decode bytes by trying each configured encoding in order.
fn decode(bytes: &[u8]) -> Result<String> {
    for label in ENCODING_LABELS {
        let encoding = match Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc,
            None => continue,
        };
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            debug!(encoding = label, "decoded upload");
            return Ok(decoded.into_owned());
        }
    }
    Err(AppError::LoadError(
        "unreadable file: no supported encoding could decode it".to_string(),
    ))
}

/// Parse decoded CSV text into a table with normalized headers.
fn parse_content(content: &str) -> Result<DataTable> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // tolerate short rows; they are padded below
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::LoadError(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let columns: Vec<String> = headers.iter().map(normalize_column_name).collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AppError::LoadError(format!("Failed to parse CSV row {}: {}", index + 1, e)))?;

        // Short rows are padded, long rows cut, so every row matches the header
        let row: Vec<String> = (0..columns.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect();
        rows.push(row);
    }

    Ok(DataTable::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_utf8_csv() {
        let bytes = "Employee Name,Salary\nAlice,90000\nBob,80000".as_bytes();
        let table = load_table(bytes).unwrap();
        assert_eq!(table.columns, vec!["employee_name", "salary"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows[0], vec!["Alice", "90000"]);
    }

    #[test]
    fn test_load_latin1_csv() {
        // "José" in latin-1: é = 0xE9, invalid as UTF-8
        let mut bytes = b"name,city\nJos".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b",Madrid");
        let table = load_table(&bytes).unwrap();
        assert_eq!(table.rows[0][0], "José");
    }

    #[test]
    fn test_header_only_file_rejected() {
        let result = load_table(b"name,age");
        assert!(matches!(result, Err(AppError::LoadError(_))));
    }

    #[test]
    fn test_short_rows_padded() {
        let table = load_table(b"a,b,c\n1,2\n4,5,6").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["4", "5", "6"]);
    }
}
