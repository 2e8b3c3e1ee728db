//! Domain models for the upload pipeline.
//!
//! - [`Cell`] - one scalar value read from the tabular source
//! - [`Row`] - ordered column → cell mapping, one per input line
//! - [`FieldValue`] - a cell after transform rules (scalar or list)
//! - [`RequestOutcome`] - the single result produced for each row
//! - [`RowResult`] - an outcome plus its row bookkeeping

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

/// The payload sent as request body: a JSON object built per row.
pub type Payload = Map<String, Value>;

// =============================================================================
// Cells and Rows
// =============================================================================

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Absent value (`None` in the source, or a missing column).
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Absent or the empty string. Whitespace-only text is not empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view used by bounds checks. NaN is not considered numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// String form used by split, strip, case and cast stages.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => format!("{:?}", f),
            Cell::Text(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Integer(i) => Value::Number((*i).into()),
            Cell::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Integer(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// One input record: column names to cells, in source column order.
///
/// Rows are read-only for the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cell, keeping first-insertion order.
    pub fn insert(&mut self, column: impl Into<String>, cell: impl Into<Cell>) {
        let column = column.into();
        let cell = cell.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = cell,
            None => self.cells.push((column, cell)),
        }
    }

    /// Builder-style [`Row::insert`].
    pub fn with(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.insert(column, cell);
        self
    }

    /// Look up a cell. `None` means the column is not in the row.
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.cells
                .iter()
                .map(|(c, v)| (c.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// =============================================================================
// Transformed values
// =============================================================================

/// A cell after its transform rules ran.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Cell),
    /// Result of `split_csv`; scalar stages skip it.
    List(Vec<String>),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(cell) => cell.to_json(),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<Cell> for FieldValue {
    fn from(cell: Cell) -> Self {
        FieldValue::Scalar(cell)
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// The single outcome recorded for each row.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The API accepted the payload; holds the parsed response body.
    Success(Value),
    /// Required columns were empty or absent.
    SkippedMissingRequired(Vec<String>),
    /// Transform or schema checks rejected the row.
    SkippedInvalidPayload(String),
    /// The call failed fatally or exhausted its retries.
    Error(String),
    /// Dry run: the payload that would have been sent.
    DryRun(Value),
}

impl RequestOutcome {
    /// Status label written to the results log.
    pub fn status(&self) -> &'static str {
        match self {
            RequestOutcome::Success(_) => "created",
            RequestOutcome::SkippedMissingRequired(_) => "skipped_missing_required",
            RequestOutcome::SkippedInvalidPayload(_) => "skipped_invalid_payload",
            RequestOutcome::Error(_) => "error",
            RequestOutcome::DryRun(_) => "dry_run",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }
}

/// A row's outcome with the bookkeeping the results log needs.
#[derive(Debug, Clone)]
pub struct RowResult {
    /// Spreadsheet line number of the row.
    pub row_index: usize,
    pub outcome: RequestOutcome,
    /// Key sent with every attempt for this row, if the row was submitted.
    pub idempotency_key: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl RowResult {
    pub fn new(row_index: usize, outcome: RequestOutcome) -> Self {
        Self {
            row_index,
            outcome,
            idempotency_key: None,
            processed_at: Utc::now(),
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
