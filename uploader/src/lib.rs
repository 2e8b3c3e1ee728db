//! # Hevyload - bulk upload spreadsheet rows to the Hevy API
//!
//! Hevyload reads a tabular export, turns each row into an exercise payload
//! through a configurable column mapping, and submits the payloads one by one
//! to an HTTP API with rate limiting, idempotency keys and retries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Pipeline   │────▶│   Client    │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (map+check) │     │ (rate+retry)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                                             results.csv
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hevyload::{parse_file, AppConfig, RowNumbering, Uploader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hevyload::RunError> {
//!     let config = AppConfig::load("hevy.yaml")?;
//!     let source = parse_file("exercises.csv", &config.source.options())?;
//!     let mut uploader = Uploader::new(config.build_client()?, config.pipeline(), config.target()?);
//!     let results = uploader.run(&source.rows, RowNumbering::default()).await;
//!     hevyload::report::write_results("results.csv", &results)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Rows, cells and per-row outcomes
//! - [`parser`] - CSV reading with auto-detection
//! - [`transform`] - Column rules, mapping and the row pipeline
//! - [`validation`] - Exercise payload checks
//! - [`client`] - Rate-limited, retrying HTTP client
//! - [`upload`] - Sequential batch driver
//! - [`config`] - YAML configuration
//! - [`report`] - Results log
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Network
pub mod client;

// Batch
pub mod upload;

// Surfaces
pub mod config;
pub mod logs;
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ClientError, ConfigError, FieldError, ReportError, RunError, SchemaError, SourceError,
    TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, FieldValue, Payload, RequestOutcome, Row, RowResult};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, parse_str,
    ParseResult, SourceOptions,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    apply_rules, check_required, get_path, map_row, set_path, CastKind, FieldMapping,
    Rejection, RequiredFields, RowPipeline, TransformRuleSet, TransformRules,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate_payload, PayloadSchema};

// =============================================================================
// Re-exports - Client
// =============================================================================

pub use client::{AuthMode, ClientConfig, RateLimiter, ResilientClient, RetryPolicy};

// =============================================================================
// Re-exports - Upload
// =============================================================================

pub use config::AppConfig;
pub use upload::{RowNumbering, Summary, Target, Uploader};
