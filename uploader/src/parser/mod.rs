//! Tabular source reader with encoding and delimiter auto-detection.
//!
//! Turns a CSV export into [`Row`]s. Nothing exercise-specific lives here.

use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::{Cell, Row};

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// How to read the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Field delimiter; detected from the header line when `None`.
    pub delimiter: Option<char>,
    /// 1-based line holding the column names. Earlier lines are skipped.
    pub header_row: usize,
    /// Turn number-looking text into numeric cells.
    pub infer_types: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            header_row: 1,
            infer_types: true,
        }
    }
}

/// Rows plus the metadata used to read them.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub rows: Vec<Row>,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to text. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Pick the candidate delimiter that occurs most often in `line`.
pub fn detect_delimiter(line: &str) -> char {
    let mut best = ',';
    let mut best_count = 0;
    for sep in DELIMITERS {
        let count = line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Type a raw cell. Empty text stays `""`.
pub fn infer_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Text(raw.to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Integer(i);
    }
    // only plain decimals; "nan" and "inf" stay text
    let looks_decimal = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if looks_decimal {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Cell::Float(f);
        }
    }
    Cell::Text(raw.to_string())
}

/// Parse decoded CSV text.
pub fn parse_str(
    content: &str,
    options: &SourceOptions,
    encoding: impl Into<String>,
) -> SourceResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(SourceError::EmptyFile);
    }

    let skip = options.header_row.max(1) - 1;
    let body = content
        .split_inclusive('\n')
        .skip(skip)
        .collect::<String>();
    let header_line = body
        .lines()
        .next()
        .ok_or(SourceError::NoHeaders(options.header_row))?;

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(header_line));
    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(SourceError::InvalidDelimiter(delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .flexible(true)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let raw = record.get(i).unwrap_or("");
                let cell = if options.infer_types {
                    infer_cell(raw)
                } else {
                    Cell::Text(raw.to_string())
                };
                (header.clone(), cell)
            })
            .collect::<Row>();
        rows.push(row);
    }

    Ok(ParseResult {
        rows,
        encoding: encoding.into(),
        delimiter,
        headers,
    })
}

/// Parse CSV bytes with encoding detection.
pub fn parse_bytes(bytes: &[u8], options: &SourceOptions) -> SourceResult<ParseResult> {
    if bytes.is_empty() {
        return Err(SourceError::EmptyFile);
    }
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    parse_str(&content, options, encoding)
}

/// Parse a CSV file with encoding detection.
pub fn parse_file<P: AsRef<Path>>(path: P, options: &SourceOptions) -> SourceResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> ParseResult {
        parse_str(csv, &SourceOptions::default(), "utf-8").unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let result = parse("Name;Reps\nSquat;5\nRow;8");
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.headers, vec!["Name", "Reps"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].get("Name"), Some(&Cell::from("Squat")));
        assert_eq!(result.rows[0].get("Reps"), Some(&Cell::Integer(5)));
    }

    #[test]
    fn test_quoted_values_with_delimiter() {
        let result = parse("Name,Muscles\n\"Bench Press\",\"triceps, shoulders\"");
        assert_eq!(result.rows[0].get("Muscles"), Some(&Cell::from("triceps, shoulders")));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let result = parse("a;b\n1;2\n\n;\n3;4\n");
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_missing_values_become_empty_text() {
        let result = parse("a;b;c\n1;;3\n4");
        assert_eq!(result.rows[0].get("b"), Some(&Cell::from("")));
        assert_eq!(result.rows[1].get("c"), Some(&Cell::from("")));
    }

    #[test]
    fn test_header_row_offset() {
        let csv = "Exported 2024-01-01\nName,Type\nDeadlift,strength\n";
        let options = SourceOptions {
            header_row: 2,
            ..SourceOptions::default()
        };
        let result = parse_str(csv, &options, "utf-8").unwrap();
        assert_eq!(result.headers, vec!["Name", "Type"]);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_header_row_past_end() {
        let options = SourceOptions {
            header_row: 5,
            ..SourceOptions::default()
        };
        assert!(matches!(
            parse_str("a,b\n1,2\n", &options, "utf-8"),
            Err(SourceError::NoHeaders(5))
        ));
    }

    #[test]
    fn test_no_inference() {
        let options = SourceOptions {
            infer_types: false,
            ..SourceOptions::default()
        };
        let result = parse_str("a,b\n0,2.5\n", &options, "utf-8").unwrap();
        assert_eq!(result.rows[0].get("a"), Some(&Cell::from("0")));
    }

    #[test]
    fn test_infer_cell() {
        assert_eq!(infer_cell("42"), Cell::Integer(42));
        assert_eq!(infer_cell("2.5"), Cell::Float(2.5));
        assert_eq!(infer_cell("nan"), Cell::from("nan"));
        assert_eq!(infer_cell("T-123"), Cell::from("T-123"));
        assert_eq!(infer_cell(""), Cell::from(""));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let options = SourceOptions {
            delimiter: Some('§'),
            ..SourceOptions::default()
        };
        assert!(matches!(
            parse_str("a§b\n1§2\n", &options, "utf-8"),
            Err(SourceError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_bytes(b"", &SourceOptions::default()),
            Err(SourceError::EmptyFile)
        ));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Développé" in ISO-8859-1
        let bytes: &[u8] = &[0x44, 0xE9, 0x76, 0x65, 0x6C, 0x6F, 0x70, 0x70, 0xE9];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Développé");
    }
}
