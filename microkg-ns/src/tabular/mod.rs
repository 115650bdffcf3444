//! Delimited table reading and writing
//!
//! Handles the two layouts the pipeline exchanges: tab-separated node tables
//! and comma-separated triage tables. Fields containing the delimiter, a quote
//! or a line break are double-quoted on write and unquoted on read.

pub mod loader;

use microkg_common::{Error, Result};
use std::fs;
use std::path::Path;

pub use loader::load_batch;

/// Field separator of a table file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
        }
    }

    /// Pick the delimiter from a header line: tab when one is present, comma otherwise
    pub fn sniff(header_line: &str) -> Self {
        if header_line.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }
}

/// Header plus data rows of a delimited file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: Delimiter,
}

impl Table {
    /// Position of a column by exact name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Split delimited text into records of fields
///
/// Blank lines are skipped. A quoted field may span lines.
pub fn parse_delimited(text: &str, delimiter: Delimiter) -> Vec<Vec<String>> {
    let delim = delimiter.as_char();
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            c if c == delim => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if field_started || !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

/// Read a delimited file, sniffing the delimiter from its first line
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(Error::NotFound(format!("Input file not found: {}", path.display())));
    }

    let text = fs::read_to_string(path)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first_line.is_empty() {
        return Err(Error::Schema(format!("Input file is empty: {}", path.display())));
    }

    let delimiter = Delimiter::sniff(first_line);
    let mut records = parse_delimited(text, delimiter).into_iter();
    let header: Vec<String> = records
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, mut row) in records.enumerate() {
        if row.len() > header.len() {
            return Err(Error::Schema(format!(
                "{}: data row {} has {} fields, header has {}",
                path.display(),
                i + 1,
                row.len(),
                header.len()
            )));
        }
        row.resize(header.len(), String::new());
        rows.push(row);
    }

    Ok(Table {
        header,
        rows,
        delimiter,
    })
}

/// Quote a field when it would otherwise break the row layout
pub fn escape_field(value: &str, delimiter: Delimiter) -> String {
    let needs_quotes = value.contains(delimiter.as_char())
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render one row
pub fn format_row<S: AsRef<str>>(fields: &[S], delimiter: Delimiter) -> String {
    let sep = delimiter.as_char().to_string();
    fields
        .iter()
        .map(|f| escape_field(f.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Write header and rows, creating the parent directory if needed
pub fn write_table<H, R>(path: &Path, delimiter: Delimiter, header: &[H], rows: &[R]) -> Result<()>
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(header, delimiter));
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row.as_ref(), delimiter));
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sniff() {
        assert_eq!(Delimiter::sniff("id\tname\tcategory"), Delimiter::Tab);
        assert_eq!(Delimiter::sniff("id,name,category"), Delimiter::Comma);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let text = "id,name\nA:1,\"Bacteroides, sp.\"\nB:2,\"say \"\"hi\"\"\"\n\nC:3,\"two\nlines\"\n";
        let records = parse_delimited(text, Delimiter::Comma);
        assert_eq!(records.len(), 4);
        assert_eq!(records[1], vec!["A:1", "Bacteroides, sp."]);
        assert_eq!(records[2], vec!["B:2", "say \"hi\""]);
        assert_eq!(records[3], vec!["C:3", "two\nlines"]);
    }

    #[test]
    fn test_parse_crlf_and_missing_trailing_newline() {
        let records = parse_delimited("id\tname\r\nA:1\tx", Delimiter::Tab);
        assert_eq!(records, vec![vec!["id", "name"], vec!["A:1", "x"]]);
    }

    #[test]
    fn test_parse_keeps_trailing_empty_field() {
        let records = parse_delimited("a,b,\n", Delimiter::Comma);
        assert_eq!(records, vec![vec!["a", "b", ""]]);
    }

    #[test]
    fn test_escape_only_when_needed() {
        assert_eq!(escape_field("plain", Delimiter::Comma), "plain");
        assert_eq!(escape_field("a,b", Delimiter::Comma), "\"a,b\"");
        assert_eq!(escape_field("a,b", Delimiter::Tab), "a,b");
        assert_eq!(escape_field("q\"", Delimiter::Tab), "\"q\"\"\"");
    }

    #[test]
    fn test_write_then_read_preserves_awkward_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.csv");
        let rows = vec![vec!["A:1".to_string(), "x, \"y\"".to_string()]];

        write_table(&path, Delimiter::Comma, &["id", "name"], &rows).unwrap();
        let table = read_table(&path).unwrap();

        assert_eq!(table.delimiter, Delimiter::Comma);
        assert_eq!(table.header, vec!["id", "name"]);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.tsv");
        fs::write(&path, "id\tname\tcategory\nA:1\tx\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["A:1", "x", ""]);
    }

    #[test]
    fn test_long_rows_are_schema_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.tsv");
        fs::write(&path, "id\tname\nA:1\tx\textra\n").unwrap();

        assert!(matches!(read_table(&path), Err(Error::Schema(_))));
    }

    #[test]
    fn test_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_table(&dir.path().join("absent.tsv")),
            Err(Error::NotFound(_))
        ));

        let empty = dir.path().join("empty.tsv");
        fs::write(&empty, "\n\n").unwrap();
        assert!(matches!(read_table(&empty), Err(Error::Schema(_))));
    }
}
