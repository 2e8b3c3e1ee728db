//! Field transform stages.
//!
//! A column's [`TransformRuleSet`] is applied by running a fixed list of
//! stages over a [`FieldValue`]:
//!
//! | # | Stage  | Applies to | Rule(s)                  |
//! |---|--------|------------|--------------------------|
//! | 1 | split  | scalar     | `split_csv` (+ `strip`)  |
//! | 2 | strip  | scalar     | `strip`                  |
//! | 3 | case   | scalar     | `uppercase`, `lowercase` |
//! | 4 | cast   | scalar     | `cast`                   |
//! | 5 | bounds | numeric    | `min`, `max`             |
//!
//! Absent or empty input skips every stage, except that an empty string
//! under `split_csv` becomes an empty list. Once `split` turns the value
//! into a list, the scalar stages leave it alone.

use crate::error::{Bound, TransformError, TransformResult};
use crate::models::{Cell, FieldValue};

use super::rules::{CastKind, TransformRuleSet};

/// A single pure transform step.
type Stage = fn(FieldValue, &TransformRuleSet) -> TransformResult<FieldValue>;

/// Stages in application order.
const STAGES: [Stage; 5] = [split, strip, case, cast, bounds];

/// Apply `rules` to `cell`.
///
/// # Errors
/// [`TransformError::Cast`] when a numeric cast cannot parse the value,
/// [`TransformError::Bounds`] when the numeric result is out of range.
///
/// # Example
/// ```
/// use hevyload::models::{Cell, FieldValue};
/// use hevyload::transform::{apply_rules, TransformRuleSet};
///
/// let rules = TransformRuleSet::default().split_csv().strip();
/// let out = apply_rules(&Cell::from(" a, b ,c"), &rules).unwrap();
/// assert_eq!(out, FieldValue::List(vec!["a".into(), "b".into(), "c".into()]));
/// ```
pub fn apply_rules(cell: &Cell, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    let value = FieldValue::Scalar(cell.clone());
    if cell.is_empty() {
        // an empty list column is still a list
        if rules.split_csv && *cell != Cell::Null {
            return Ok(FieldValue::List(Vec::new()));
        }
        return Ok(value);
    }
    STAGES.iter().try_fold(value, |value, stage| stage(value, rules))
}

fn split(value: FieldValue, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    match value {
        FieldValue::Scalar(cell) if rules.split_csv => {
            let text = cell.to_text();
            let pieces = text
                .split(',')
                .map(|p| if rules.strip { p.trim() } else { p })
                .map(str::to_string)
                .collect();
            Ok(FieldValue::List(pieces))
        }
        other => Ok(other),
    }
}

fn strip(value: FieldValue, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    match value {
        FieldValue::Scalar(cell) if rules.strip => {
            Ok(FieldValue::Scalar(Cell::Text(cell.to_text().trim().to_string())))
        }
        other => Ok(other),
    }
}

fn case(value: FieldValue, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    match value {
        FieldValue::Scalar(cell) if rules.uppercase || rules.lowercase => {
            let mut text = cell.to_text();
            if rules.uppercase {
                text = text.to_uppercase();
            }
            if rules.lowercase {
                text = text.to_lowercase();
            }
            Ok(FieldValue::Scalar(Cell::Text(text)))
        }
        other => Ok(other),
    }
}

fn cast(value: FieldValue, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    match (value, rules.cast) {
        (FieldValue::Scalar(cell), Some(kind)) => cast_cell(&cell, kind).map(FieldValue::Scalar),
        (other, _) => Ok(other),
    }
}

fn bounds(value: FieldValue, rules: &TransformRuleSet) -> TransformResult<FieldValue> {
    let FieldValue::Scalar(cell) = &value else {
        return Ok(value);
    };
    let Some(number) = cell.as_f64() else {
        return Ok(value);
    };
    if let Some(min) = rules.min {
        if number < min {
            return Err(TransformError::Bounds {
                value: number,
                bound: Bound::Min(min),
            });
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            return Err(TransformError::Bounds {
                value: number,
                bound: Bound::Max(max),
            });
        }
    }
    Ok(value)
}

fn cast_cell(cell: &Cell, kind: CastKind) -> TransformResult<Cell> {
    match kind {
        CastKind::Str => Ok(Cell::Text(cell.to_text())),
        CastKind::Float => parse_number(cell, kind).map(Cell::Float),
        CastKind::Int => {
            let number = parse_number(cell, kind)?;
            if !number.is_finite() || number.abs() >= i64::MAX as f64 {
                return Err(cast_error(cell, kind));
            }
            Ok(Cell::Integer(number.trunc() as i64))
        }
    }
}

fn parse_number(cell: &Cell, kind: CastKind) -> TransformResult<f64> {
    match cell {
        Cell::Integer(i) => Ok(*i as f64),
        Cell::Float(f) => Ok(*f),
        Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| cast_error(cell, kind)),
        Cell::Null => Err(cast_error(cell, kind)),
    }
}

fn cast_error(cell: &Cell, kind: CastKind) -> TransformError {
    TransformError::Cast {
        value: cell.to_text(),
        target: kind.name(),
    }
}
