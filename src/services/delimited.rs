//! CSV and TSV parsing into a single-sheet [`Workbook`].
//!
//! Column types are inferred from a sample of the data so numbers, booleans
//! and dates keep their type in the table.
//!
//! Content with more than [`MAX_CSV_ROWS`] rows is rejected with
//! [`IngestError::TooManyRows`].

use super::WorkbookParser;
use crate::constants::MAX_CSV_ROWS;
use crate::error::{IngestError, IngestResult};
use crate::types::{DataCell, DataRow, DataType, Sheet, TableData, Workbook};

/// Rows sampled per column for type inference
const TYPE_SAMPLE_ROWS: usize = 100;

/// [`WorkbookParser`] for delimited text.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelimitedParser;

impl WorkbookParser for DelimitedParser {
    fn parse(&self, file_name: &str, bytes: &[u8]) -> IngestResult<Workbook> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| IngestError::Parse(format!("{file_name} is not UTF-8 text: {e}")))?;
        let delimiter = detect_delimiter(file_name, content);
        let data = parse_delimited(content, delimiter)?;
        let name = sheet_name_for(file_name);
        Ok(Workbook {
            sheets: vec![Sheet { name, data }],
        })
    }
}

fn sheet_name_for(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Sheet1")
        .to_string()
}

/// Parse delimited content. The first record is the header row.
pub fn parse_delimited(content: &str, delimiter: char) -> IngestResult<TableData> {
    let content = content.trim_start_matches('\u{feff}');
    let mut records = Records::new(content, delimiter);

    let header = records
        .next()
        .ok_or_else(|| IngestError::Parse("empty file".to_string()))?;
    let headers: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::Parse("no columns".to_string()));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if raw_rows.len() >= MAX_CSV_ROWS {
            return Err(IngestError::TooManyRows {
                rows: raw_rows.len() + 1,
                max_rows: MAX_CSV_ROWS,
            });
        }
        raw_rows.push(record);
    }

    let types: Vec<DataType> = (0..headers.len())
        .map(|i| infer_column_type(&raw_rows, i))
        .collect();

    let rows = raw_rows
        .iter()
        .map(|raw| {
            let cells = types
                .iter()
                .enumerate()
                .map(|(i, ty)| {
                    let value = raw.get(i).map(|s| s.trim()).unwrap_or("");
                    parse_cell(value, *ty)
                })
                .collect();
            DataRow::new(cells)
        })
        .collect();

    Ok(TableData::new(headers, rows))
}

/// `.tsv` means tab; otherwise the most frequent of tab, semicolon, comma in
/// the first lines.
pub fn detect_delimiter(file_name: &str, content: &str) -> char {
    if file_name.to_lowercase().ends_with(".tsv") {
        return '\t';
    }

    let head: String = content.lines().take(5).collect::<Vec<_>>().join("\n");
    let commas = head.matches(',').count();
    let tabs = head.matches('\t').count();
    let semicolons = head.matches(';').count();

    if tabs > commas && tabs > semicolons {
        '\t'
    } else if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Records of delimited text. Double-quoted fields may contain the
/// delimiter, `""` escapes and line breaks; `\r\n` ends a record like `\n`.
struct Records<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    delimiter: char,
}

impl<'a> Records<'a> {
    fn new(content: &'a str, delimiter: char) -> Self {
        Self {
            chars: content.chars().peekable(),
            delimiter,
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        self.chars.peek()?;

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;

        while let Some(c) = self.chars.next() {
            match c {
                '"' if in_quotes && self.chars.peek() == Some(&'"') => {
                    field.push('"');
                    self.chars.next();
                }
                '"' => in_quotes = !in_quotes,
                '\r' if !in_quotes && self.chars.peek() == Some(&'\n') => {}
                '\n' if !in_quotes => break,
                c if c == self.delimiter && !in_quotes => fields.push(std::mem::take(&mut field)),
                c => field.push(c),
            }
        }
        fields.push(field);
        Some(fields)
    }
}

fn strip_number_symbols(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | '€' | '£' | ','))
        .collect()
}

/// Numbers may carry a single currency or percent symbol and at most one
/// thousands separator.
fn looks_like_number(s: &str) -> bool {
    let s = s.trim();
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let symbols = s.chars().filter(|c| matches!(c, '$' | '%' | '€' | '£')).count();
    if symbols > 1 || s.matches(',').count() > 1 {
        return false;
    }
    strip_number_symbols(s).parse::<f64>().is_ok()
}

fn looks_like_date(s: &str) -> bool {
    let s = s.trim();
    (8..=10).contains(&s.len())
        && (s.contains('-') || s.contains('/'))
        && s.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '/')
}

fn infer_column_type(rows: &[Vec<String>], col: usize) -> DataType {
    let sample: Vec<&str> = rows
        .iter()
        .take(TYPE_SAMPLE_ROWS)
        .filter_map(|r| r.get(col).map(|s| s.trim()))
        .filter(|s| !s.is_empty())
        .collect();

    if sample.is_empty() {
        return DataType::Text;
    }
    if sample.iter().all(|s| looks_like_number(s)) {
        return DataType::Number;
    }
    if sample.iter().all(|s| {
        matches!(
            s.to_lowercase().as_str(),
            "true" | "false" | "yes" | "no"
        )
    }) {
        return DataType::Boolean;
    }
    if sample.iter().all(|s| looks_like_date(s)) {
        return DataType::Date;
    }
    DataType::Text
}

fn parse_cell(value: &str, ty: DataType) -> DataCell {
    match ty {
        DataType::Number if !value.is_empty() => strip_number_symbols(value)
            .parse::<f64>()
            .map(DataCell::Number)
            .unwrap_or_else(|_| DataCell::Text(value.to_string())),
        _ => DataCell::parse(value, ty),
    }
}
