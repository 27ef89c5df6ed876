//! Minimal comma-separated table reading and writing.
//!
//! Fields containing a comma, quote or newline are quoted, with embedded
//! quotes doubled.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{CdaError, CdaResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Push a row given as (column, value) pairs. Unknown columns are
    /// dropped and absent ones left empty.
    pub fn push_aligned(&mut self, cells: &[(String, String)]) {
        let row = self
            .header
            .iter()
            .map(|h| {
                cells
                    .iter()
                    .find(|(name, _)| name == h)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        self.rows.push(row);
    }

    pub fn to_csv(&self) -> String {
        let mut out = format_line(&self.header);
        for row in &self.rows {
            out.push_str(&format_line(row));
        }
        out
    }

    pub fn parse(path: &Path, text: &str) -> CdaResult<Self> {
        let mut records = parse_records(path, text)?.into_iter();
        let header = records.next().unwrap_or_default();
        let rows = records
            .map(|mut row| {
                row.resize(header.len(), String::new());
                row
            })
            .collect();
        Ok(Self { header, rows })
    }
}

pub fn read_table(path: &Path) -> CdaResult<Table> {
    let text = fs::read_to_string(path).map_err(|e| CdaError::io(path, e))?;
    Table::parse(path, &text)
}

pub fn write_table(path: &Path, table: &Table) -> CdaResult<()> {
    fs::write(path, table.to_csv()).map_err(|e| CdaError::io(path, e))
}

/// Append rows to `path`, creating it with `header` when absent.
///
/// When the file exists, rows are aligned to its existing header so the
/// header is written exactly once. Returns the number of rows written.
pub fn append_rows(path: &Path, header: &[String], rows: &[Vec<(String, String)>]) -> CdaResult<usize> {
    let existing_header = if path.exists() {
        let text = fs::read_to_string(path).map_err(|e| CdaError::io(path, e))?;
        parse_records(path, &text)?.into_iter().next()
    } else {
        None
    };

    let mut table = Table::new(existing_header.clone().unwrap_or_else(|| header.to_vec()));
    for cells in rows {
        table.push_aligned(cells);
    }

    let mut out = String::new();
    if existing_header.is_none() {
        out.push_str(&format_line(&table.header));
    }
    for row in &table.rows {
        out.push_str(&format_line(row));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CdaError::io(path, e))?;
    file.write_all(out.as_bytes())
        .map_err(|e| CdaError::io(path, e))?;
    Ok(table.rows.len())
}

pub fn format_line<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_records(path: &Path, text: &str) -> CdaResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CdaError::Malformed {
            path: path.to_path_buf(),
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn quoting_roundtrip() {
        let mut table = Table::new(vec!["name".into(), "value".into()]);
        table.rows.push(vec!["a,b".into(), "say \"hi\"".into()]);
        table.rows.push(vec!["plain".into(), String::new()]);
        let parsed = Table::parse(p(), &table.to_csv()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn parses_crlf_and_blank_lines() {
        let t = Table::parse(p(), "a,b\r\n1,2\r\n\r\n3\r\n").unwrap();
        assert_eq!(t.header, vec!["a", "b"]);
        assert_eq!(t.rows, vec![vec!["1", "2"], vec!["3", ""]]);
    }

    #[test]
    fn missing_trailing_newline() {
        let t = Table::parse(p(), "x\n1").unwrap();
        assert_eq!(t.rows, vec![vec!["1"]]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = Table::parse(p(), "a\n\"oops\n").unwrap_err();
        assert!(matches!(err, CdaError::Malformed { .. }));
    }

    #[test]
    fn aligned_push_drops_unknown_columns() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_aligned(&[("b".into(), "2".into()), ("z".into(), "9".into())]);
        assert_eq!(t.rows[0], vec!["", "2"]);
    }
}
