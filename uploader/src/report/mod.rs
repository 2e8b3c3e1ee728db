//! Results log.
//!
//! One CSV line per processed row, in processing order:
//!
//! ```text
//! row_index,status,processed_at,missing,error,idempotency_key,response,payload
//! 2,created,2024-05-01T10:00:00Z,,,0b6f...,"{""id"":""abc""}",
//! 3,skipped_missing_required,2024-05-01T10:00:01Z,Name;Type,,,,
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ReportError;
use crate::models::{RequestOutcome, RowResult};
use crate::upload::Summary;

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    row_index: usize,
    status: &'static str,
    processed_at: String,
    missing: String,
    error: &'a str,
    idempotency_key: &'a str,
    response: String,
    payload: String,
}

impl<'a> ResultRecord<'a> {
    fn from_result(result: &'a RowResult) -> Result<Self, ReportError> {
        let mut record = ResultRecord {
            row_index: result.row_index,
            status: result.outcome.status(),
            processed_at: result.processed_at.to_rfc3339(),
            missing: String::new(),
            error: "",
            idempotency_key: result.idempotency_key.as_deref().unwrap_or(""),
            response: String::new(),
            payload: String::new(),
        };
        match &result.outcome {
            RequestOutcome::Success(body) => record.response = compact(body)?,
            RequestOutcome::DryRun(payload) => record.payload = compact(payload)?,
            RequestOutcome::SkippedMissingRequired(fields) => record.missing = fields.join(";"),
            RequestOutcome::SkippedInvalidPayload(reason) | RequestOutcome::Error(reason) => {
                record.error = reason
            }
        }
        Ok(record)
    }
}

fn compact(value: &Value) -> Result<String, ReportError> {
    Ok(serde_json::to_string(value)?)
}

/// Write `results` as CSV to any writer.
pub fn write_to<W: Write>(writer: W, results: &[RowResult]) -> Result<Summary, ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        csv.serialize(ResultRecord::from_result(result)?)?;
    }
    if results.is_empty() {
        csv.write_record([
            "row_index",
            "status",
            "processed_at",
            "missing",
            "error",
            "idempotency_key",
            "response",
            "payload",
        ])?;
    }
    csv.flush()?;
    Ok(Summary::from_results(results))
}

/// Write the results log to `path`, replacing any existing file.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    results: &[RowResult],
) -> Result<Summary, ReportError> {
    let file = File::create(path.as_ref())?;
    write_to(file, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(results: &[RowResult]) -> String {
        let mut out = Vec::new();
        write_to(&mut out, results).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_and_statuses() {
        let results = vec![
            RowResult::new(2, RequestOutcome::Success(json!({"id": "abc"})))
                .with_idempotency_key("k-1"),
            RowResult::new(
                3,
                RequestOutcome::SkippedMissingRequired(vec!["Name".into(), "Type".into()]),
            ),
            RowResult::new(4, RequestOutcome::Error("API error 400: bad".into()))
                .with_idempotency_key("k-2"),
        ];
        let text = render(&results);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "row_index,status,processed_at,missing,error,idempotency_key,response,payload"
        );
        assert!(lines[1].starts_with("2,created,"));
        assert!(lines[1].contains(",k-1,"));
        assert!(lines[1].contains(r#""{""id"":""abc""}""#));
        assert!(lines[2].starts_with("3,skipped_missing_required,"));
        assert!(lines[2].contains(",Name;Type,"));
        assert!(lines[3].contains("API error 400: bad"));
    }

    #[test]
    fn test_dry_run_payload_column() {
        let payload = json!({"exercise": {"title": "Squat"}});
        let results = vec![RowResult::new(2, RequestOutcome::DryRun(payload))];
        let text = render(&results);
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "dry_run");
        assert_eq!(&record[7], r#"{"exercise":{"title":"Squat"}}"#);
        assert!(chrono::DateTime::parse_from_rfc3339(&record[2]).is_ok());
    }

    #[test]
    fn test_empty_results_still_has_header() {
        assert_eq!(
            render(&[]).trim_end(),
            "row_index,status,processed_at,missing,error,idempotency_key,response,payload"
        );
    }

    #[test]
    fn test_write_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let results = vec![
            RowResult::new(2, RequestOutcome::Success(json!({}))),
            RowResult::new(
                3,
                RequestOutcome::SkippedInvalidPayload("missing exercise.title".into()),
            ),
        ];
        let summary = write_results(&path, &results).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.count("created"), 1);
        assert_eq!(summary.count("skipped_invalid_payload"), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }
}
