//! Per-row preparation: everything that happens before the network.
//!
//! ```text
//! Row ──▶ required check ──▶ map (rules + paths) ──▶ schema check ──▶ Payload
//!              │                    │                     │
//!              ▼                    ▼                     ▼
//!       MissingRequired       Transform error        Schema error
//! ```
//!
//! Every rejection is row-scoped and maps onto a
//! [`RequestOutcome`](crate::models::RequestOutcome).

use crate::error::{FieldError, SchemaError};
use crate::models::{Payload, RequestOutcome, Row};
use crate::validation::PayloadSchema;

use super::mapper::{check_required, map_row, FieldMapping, RequiredFields};
use super::rules::TransformRules;

/// Why a row was not turned into a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    MissingRequired(Vec<String>),
    Transform(FieldError),
    Schema(SchemaError),
}

impl From<Rejection> for RequestOutcome {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MissingRequired(fields) => RequestOutcome::SkippedMissingRequired(fields),
            Rejection::Transform(err) => RequestOutcome::SkippedInvalidPayload(err.to_string()),
            Rejection::Schema(err) => RequestOutcome::SkippedInvalidPayload(err.to_string()),
        }
    }
}

/// Static per-run configuration for turning rows into payloads.
#[derive(Debug, Clone, Default)]
pub struct RowPipeline {
    pub mapping: FieldMapping,
    pub rules: TransformRules,
    pub required: RequiredFields,
    pub schema: PayloadSchema,
}

impl RowPipeline {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: TransformRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_required(mut self, required: RequiredFields) -> Self {
        self.required = required;
        self
    }

    pub fn with_schema(mut self, schema: PayloadSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Build and validate the payload for `row`.
    pub fn prepare(&self, row: &Row) -> Result<Payload, Rejection> {
        let missing = check_required(row, &self.required);
        if !missing.is_empty() {
            return Err(Rejection::MissingRequired(missing));
        }

        let mut payload =
            map_row(row, &self.mapping, &self.rules).map_err(Rejection::Transform)?;
        self.schema
            .validate(&mut payload)
            .map_err(Rejection::Schema)?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::rules::{CastKind, TransformRuleSet};
    use serde_json::json;

    fn pipeline() -> RowPipeline {
        RowPipeline::new(
            FieldMapping::new()
                .with("Name", "exercise.title")
                .with("Type", "exercise.exercise_type")
                .with("Equip", "exercise.equipment_category")
                .with("Muscle", "exercise.muscle_group")
                .with("Other", "exercise.other_muscles"),
        )
        .with_rules(
            TransformRules::new().with("Other", TransformRuleSet::default().split_csv().strip()),
        )
        .with_required(RequiredFields::new(["Name"]))
    }

    fn bench_press() -> Row {
        Row::new()
            .with("Name", "Bench Press")
            .with("Type", "strength")
            .with("Equip", "barbell")
            .with("Muscle", "chest")
    }

    #[test]
    fn test_prepare_normalizes_missing_list() {
        let payload = pipeline().prepare(&bench_press()).unwrap();
        assert_eq!(payload["exercise"]["other_muscles"], json!([]));
    }

    #[test]
    fn test_prepare_splits_list() {
        let row = bench_press().with("Other", "triceps, front delts");
        let payload = pipeline().prepare(&row).unwrap();
        assert_eq!(payload["exercise"]["other_muscles"], json!(["triceps", "front delts"]));
    }

    #[test]
    fn test_missing_required_checked_before_mapping() {
        let row = bench_press().with("Name", "");
        assert_eq!(
            pipeline().prepare(&row),
            Err(Rejection::MissingRequired(vec!["Name".into()]))
        );
    }

    #[test]
    fn test_schema_rejection_becomes_invalid_payload() {
        let row = bench_press().with("Muscle", "");
        let outcome: RequestOutcome = pipeline().prepare(&row).unwrap_err().into();
        assert_eq!(
            outcome,
            RequestOutcome::SkippedInvalidPayload("missing exercise.muscle_group".into())
        );
    }

    #[test]
    fn test_transform_rejection_becomes_invalid_payload() {
        let mut p = pipeline();
        p.mapping = p.mapping.with("Weight", "exercise.weight");
        p.rules = p.rules.with("Weight", TransformRuleSet::default().cast(CastKind::Float));
        let row = bench_press().with("Weight", "heavy");
        let outcome: RequestOutcome = p.prepare(&row).unwrap_err().into();
        assert!(matches!(
            outcome,
            RequestOutcome::SkippedInvalidPayload(msg) if msg.contains("Weight")
        ));
    }
}
