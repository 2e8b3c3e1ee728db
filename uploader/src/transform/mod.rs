//! Transformation module.
//!
//! Turns one input row into an API payload:
//! - Path: dotted-path writes into nested objects
//! - Rules: per-column transform configuration
//! - Stages: ordered application of the rules to a cell
//! - Mapper: required-field check and column → path mapping
//! - Pipeline: required check → mapping → payload validation for one row

pub mod mapper;
pub mod path;
pub mod pipeline;
pub mod rules;
pub mod stages;

pub use mapper::{check_required, map_row, FieldMapping, RequiredFields};
pub use path::{get_path, set_path};
pub use pipeline::{Rejection, RowPipeline};
pub use rules::{CastKind, TransformRuleSet, TransformRules};
pub use stages::apply_rules;
