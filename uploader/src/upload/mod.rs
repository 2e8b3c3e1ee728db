//! Batch upload driver.
//!
//! Walks rows strictly in order. Each row is prepared, then submitted
//! (with all of its retries) before the next one starts, and yields exactly
//! one [`RowResult`]. No row-level failure stops the batch.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut uploader = Uploader::new(client, pipeline, Target::post("/v1/exercise_templates"));
//! let results = uploader.run(&rows, RowNumbering::default()).await;
//! let summary = Summary::from_results(&results);
//! ```

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::ResilientClient;
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::{Payload, RequestOutcome, Row, RowResult};
use crate::transform::RowPipeline;

/// Endpoint every row is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub method: Method,
    pub path: String,
}

impl Target {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }
}

/// Maps a row's position in the batch to its spreadsheet line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowNumbering {
    /// Offset of the first row in the batch within the data rows.
    pub start: usize,
    /// 1-based line of the header.
    pub header_row: usize,
}

impl Default for RowNumbering {
    fn default() -> Self {
        Self {
            start: 0,
            header_row: 1,
        }
    }
}

impl RowNumbering {
    pub fn line(&self, idx: usize) -> usize {
        self.start + idx + self.header_row + 1
    }
}

/// Rows `start..start + limit`, clamped to what exists.
pub fn window(rows: &[Row], start: usize, limit: Option<usize>) -> &[Row] {
    let from = start.min(rows.len());
    let to = limit.map_or(rows.len(), |n| from.saturating_add(n).min(rows.len()));
    &rows[from..to]
}

/// Sequential row processor.
pub struct Uploader {
    client: ResilientClient,
    pipeline: RowPipeline,
    target: Target,
    dry_run: bool,
}

impl Uploader {
    pub fn new(client: ResilientClient, pipeline: RowPipeline, target: Target) -> Self {
        Self {
            client,
            pipeline,
            target,
            dry_run: false,
        }
    }

    /// Prepare and log payloads without sending anything.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Process one row into its result.
    pub async fn process_row(&mut self, row: &Row, row_index: usize) -> RowResult {
        let payload = match self.pipeline.prepare(row) {
            Ok(payload) => payload,
            Err(rejection) => {
                let outcome = RequestOutcome::from(rejection);
                log_warning(format!(
                    "Row {}: {} ({})",
                    row_index,
                    outcome.status(),
                    describe(&outcome)
                ));
                return RowResult::new(row_index, outcome);
            }
        };

        if self.dry_run {
            self.log_dry_run(row_index, &payload);
            return RowResult::new(row_index, RequestOutcome::DryRun(Value::Object(payload)));
        }

        // one key per row, shared by every retry of that row
        let key = ResilientClient::new_idempotency_key();
        let result = self
            .client
            .send(&self.target.method, &self.target.path, &payload, Some(&key))
            .await;

        let outcome = match result {
            Ok(body) => {
                log_success(format!("Row {}: created", row_index));
                RequestOutcome::Success(body)
            }
            Err(err) => {
                log_error(format!("Row {}: {}", row_index, err));
                RequestOutcome::Error(err.to_string())
            }
        };
        RowResult::new(row_index, outcome).with_idempotency_key(key)
    }

    /// Process every row in order.
    pub async fn run(&mut self, rows: &[Row], numbering: RowNumbering) -> Vec<RowResult> {
        log_info(format!("Processing {} row(s)...", rows.len()));
        let mut results = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            results.push(self.process_row(row, numbering.line(idx)).await);
        }
        results
    }

    fn log_dry_run(&self, row_index: usize, payload: &Payload) {
        log_info(format!("---- DRY RUN REQUEST (row {}) ----", row_index));
        let endpoint = format!(
            "Endpoint: {} {}{}",
            self.target.method,
            self.client.base_url(),
            self.target.path
        );
        log_info_indent(endpoint, 1);
        for (name, value) in self.client.default_headers().iter() {
            let shown = mask(value.to_str().unwrap_or("<binary>"));
            log_info_indent(format!("{}: {}", name, shown), 1);
        }
        let body = serde_json::to_string_pretty(payload).unwrap_or_default();
        log_info_indent(format!("Payload:\n{}", body), 1);
    }
}

fn describe(outcome: &RequestOutcome) -> String {
    match outcome {
        RequestOutcome::SkippedMissingRequired(fields) => {
            format!("missing {}", fields.join(", "))
        }
        RequestOutcome::SkippedInvalidPayload(reason) | RequestOutcome::Error(reason) => {
            reason.clone()
        }
        RequestOutcome::Success(_) | RequestOutcome::DryRun(_) => String::new(),
    }
}

/// Keep the first four characters of a secret.
fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

/// Per-status counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub counts: BTreeMap<&'static str, usize>,
    pub total: usize,
}

impl Summary {
    pub fn from_results(results: &[RowResult]) -> Self {
        let mut summary = Summary::default();
        for result in results {
            *summary.counts.entry(result.outcome.status()).or_insert(0) += 1;
            summary.total += 1;
        }
        summary
    }

    pub fn count(&self, status: &str) -> usize {
        self.counts.get(status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_numbering_matches_sheet_lines() {
        let numbering = RowNumbering::default();
        assert_eq!(numbering.line(0), 2);
        let numbering = RowNumbering { start: 10, header_row: 3 };
        assert_eq!(numbering.line(0), 14);
        assert_eq!(numbering.line(2), 16);
    }

    #[test]
    fn test_window() {
        let rows: Vec<Row> = (0..5).map(|i| Row::new().with("n", i as i64)).collect();
        assert_eq!(window(&rows, 0, None).len(), 5);
        assert_eq!(window(&rows, 1, Some(2)), &rows[1..3]);
        assert_eq!(window(&rows, 4, Some(10)).len(), 1);
        assert!(window(&rows, 9, Some(1)).is_empty());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("Bearer abcdef"), "Bear****");
        assert_eq!(mask("abc"), "****");
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            RowResult::new(2, RequestOutcome::Success(Value::Null)),
            RowResult::new(3, RequestOutcome::Error("boom".into())),
            RowResult::new(4, RequestOutcome::Success(Value::Null)),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count("created"), 2);
        assert_eq!(summary.count("error"), 1);
        assert_eq!(summary.count("dry_run"), 0);
    }
}
