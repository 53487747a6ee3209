//! CSV ingestion
//!
//! Turns uploaded bytes into a [`Table`]. The parser is deliberately lenient:
//!
//! 1. bytes are decoded as UTF-8 with invalid sequences replaced
//! 2. payloads that arrived with escaped line breaks (`\n` / `\r\n` as two
//!    characters) and no real line break are unescaped
//! 3. a payload wrapped in one pair of quotes (a JSON-encoded string) is unwrapped
//! 4. the first line is the header; rows with more fields than the header are
//!    skipped, shorter rows are padded with missing cells
//! 5. a result that collapsed into one column whose values still contain a
//!    delimiter is parsed once more with a detected delimiter
//!
//! Only input without any header at all is a [`ChemvizError::Parse`].

use crate::error::{ChemvizError, Result};
use crate::table::{Cell, Table};
use std::borrow::Cow;

/// Delimiters tried when a parse collapses into a single column.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

const DEFAULT_DELIMITER: u8 = b',';

/// Decode raw upload bytes, replacing invalid UTF-8 and dropping a BOM.
pub fn decode(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Undo transport artifacts: escaped line breaks and a wrapping quote pair.
///
/// Escapes are only rewritten when the text has no real line break, so a
/// well-formed file that happens to contain a literal `\n` in a field is left
/// alone.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);

    if let Some(inner) = unwrap_quoted_payload(&out) {
        out = Cow::Owned(inner);
    }

    let has_real_break = out.contains('\n') || out.contains('\r');
    if !has_real_break && (out.contains("\\r\\n") || out.contains("\\n")) {
        out = Cow::Owned(out.replace("\\r\\n", "\r\n").replace("\\n", "\n"));
    }

    out
}

fn unwrap_quoted_payload(text: &str) -> Option<String> {
    let trimmed = text.trim_end();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];

    // Only unescaped quotes mean the quotes belong to CSV fields.
    let stripped_escapes = inner.replace("\\\"", "");
    if stripped_escapes.contains('"') {
        return None;
    }
    Some(inner.replace("\\\"", "\""))
}

/// Parse uploaded bytes into a table.
pub fn parse_bytes(raw: &[u8]) -> Result<Table> {
    parse_text(&decode(raw))
}

/// Parse CSV text into a table.
pub fn parse_text(text: &str) -> Result<Table> {
    let text = normalize(text);
    if text.trim().is_empty() {
        return Err(ChemvizError::parse("No columns to parse from file"));
    }

    let table = parse_with(&text, DEFAULT_DELIMITER)?;

    if collapsed_into_one_column(&table) {
        if let Some(retried) = retry_with_detected_delimiter(&text) {
            if retried.width() > 1 {
                tracing::debug!(
                    columns = retried.width(),
                    "Re-parsed single-column CSV with detected delimiter"
                );
                return Ok(retried);
            }
        }
    }

    Ok(table)
}

fn parse_with(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| ChemvizError::parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.iter().all(|c| c.trim().is_empty()) {
        return Err(ChemvizError::parse("No columns to parse from file"));
    }

    let width = columns.len();
    let mut table = Table::new(columns);
    let mut skipped = 0usize;

    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) if record.len() > width => {
                skipped += 1;
                tracing::debug!(
                    row = index + 1,
                    expected = width,
                    found = record.len(),
                    "Skipping row with too many fields"
                );
            },
            Ok(record) => table.push_row(record.iter().map(Cell::parse).collect()),
            Err(e) => {
                skipped += 1;
                tracing::debug!(row = index + 1, error = %e, "Skipping unreadable row");
            },
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, kept = table.len(), "Skipped malformed CSV rows");
    }

    Ok(table)
}

fn contains_candidate(text: &str) -> bool {
    text.bytes().any(|b| DELIMITER_CANDIDATES.contains(&b))
}

fn collapsed_into_one_column(table: &Table) -> bool {
    if table.width() != 1 {
        return false;
    }
    contains_candidate(&table.columns()[0])
        || table.column(0).any(|cell| match cell {
            Cell::Text(text) => contains_candidate(text),
            _ => false,
        })
}

fn strip_line_quotes(line: &str) -> &str {
    let line = line.trim_end_matches('\r');
    if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
        let inner = &line[1..line.len() - 1];
        if !inner.contains('"') {
            return inner;
        }
    }
    line
}

fn detect_delimiter(header: &str) -> Option<u8> {
    DELIMITER_CANDIDATES
        .iter()
        .map(|&d| (d, header.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .max_by_key(|&(_, count)| count)
        .map(|(d, _)| d)
}

fn retry_with_detected_delimiter(text: &str) -> Option<Table> {
    let unwrapped = text
        .lines()
        .map(strip_line_quotes)
        .collect::<Vec<_>>()
        .join("\n");

    let header = unwrapped.lines().find(|l| !l.trim().is_empty())?;
    let delimiter = detect_delimiter(header)?;
    parse_with(&unwrapped, delimiter).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const BASIC: &str = "Type,Flowrate\nA,10\nB,20\nA,30\n";

    #[test]
    fn test_parse_basic() {
        let table = parse_text(BASIC).unwrap();
        assert_eq!(table.columns(), &["Type".to_string(), "Flowrate".to_string()]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.row(1).unwrap()[1], Cell::number(20.0));
    }

    #[test]
    fn test_row_with_extra_fields_is_skipped() {
        let text = format!("{}A,not_a_number,extra_field\n", BASIC);
        let table = parse_text(&text).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.numeric_values(1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_short_rows_are_kept() {
        let table = parse_text("a,b,c\n1,2\n").unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.row(0).unwrap()[2].is_missing());
    }

    #[test]
    fn test_escaped_newlines_are_normalized() {
        let table = parse_text("Type,Flowrate\\nA,10\\r\\nB,20").unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_real_line_breaks_disable_unescaping() {
        let text = "Name,Note\nP1,see \\n manual\n";
        assert_eq!(normalize(text), text);
        let table = parse_text(text).unwrap();
        assert_eq!(table.row(0).unwrap()[1], Cell::Text("see \\n manual".into()));
    }

    #[test]
    fn test_quote_wrapped_payload_is_unwrapped() {
        let table = parse_text("\"Type,Flowrate\\nA,10\\nB,12\"").unwrap();
        assert_eq!(table.columns()[0], "Type");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_quoted_fields_are_not_unwrapped() {
        let text = "\"Type\",\"Flowrate\"\n\"A\",\"10\"";
        assert_eq!(normalize(text), text);
        let table = parse_text(text).unwrap();
        assert_eq!(table.columns()[1], "Flowrate");
        assert_eq!(table.row(0).unwrap()[1], Cell::number(10.0));
    }

    #[test]
    fn test_single_column_retry_detects_delimiter() {
        let table = parse_text("Type;Flowrate;Pressure\nA;10;1.5\nB;20;2.5\n").unwrap();
        assert_eq!(table.width(), 3);
        assert_eq!(table.numeric_values(2), vec![1.5, 2.5]);
    }

    #[test]
    fn test_line_quoted_rows_are_split_on_retry() {
        let table = parse_text("\"Type,Flowrate\"\n\"A,10\"\n\"B,20\"\n").unwrap();
        assert_eq!(table.width(), 2);
        assert_eq!(table.numeric_values(1), vec![10.0, 20.0]);
    }

    #[test]
    fn test_header_only_is_an_empty_table() {
        let table = parse_text("Type,Flowrate\n").unwrap();
        assert_eq!(table.width(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_input_is_a_parse_error() {
        assert!(matches!(parse_text(""), Err(ChemvizError::Parse(_))));
        assert!(matches!(parse_text("  \n\n"), Err(ChemvizError::Parse(_))));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut bytes = b"Type,Flowrate\nA".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b",10\n");
        let table = parse_bytes(&bytes).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.row(0).unwrap()[1], Cell::number(10.0));
    }

    #[test]
    fn test_bom_is_dropped() {
        let table = parse_bytes("\u{feff}Type,Flowrate\nA,1\n".as_bytes()).unwrap();
        assert_eq!(table.columns()[0], "Type");
    }
}
