//! Per-column transform rule configuration.
//!
//! Rules are declared as flags in config; [`super::stages`] applies them in
//! a fixed order regardless of how they are written.
//!
//! ```yaml
//! transforms:
//!   Muscles:
//!     split_csv: true
//!     strip: true
//!   Weight:
//!     cast: float
//!     min: 0
//!     max: 500
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Target type for the `cast` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastKind {
    Float,
    /// Parsed as a float, then truncated toward zero.
    Int,
    Str,
}

impl CastKind {
    pub fn name(&self) -> &'static str {
        match self {
            CastKind::Float => "float",
            CastKind::Int => "int",
            CastKind::Str => "str",
        }
    }
}

/// Transform rules for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformRuleSet {
    /// Split the value on `,` into a list of strings.
    pub split_csv: bool,
    /// Trim whitespace (each piece, when combined with `split_csv`).
    pub strip: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub cast: Option<CastKind>,
    /// Inclusive lower bound on the final numeric value.
    pub min: Option<f64>,
    /// Inclusive upper bound on the final numeric value.
    pub max: Option<f64>,
}

impl TransformRuleSet {
    /// True when no rule is set; the value passes through untouched.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    pub fn split_csv(mut self) -> Self {
        self.split_csv = true;
        self
    }

    pub fn strip(mut self) -> Self {
        self.strip = true;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn cast(mut self, kind: CastKind) -> Self {
        self.cast = Some(kind);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Reject rule sets that can never succeed.
    pub fn validate(&self, column: &str) -> ConfigResult<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ConfigError::invalid(
                    format!("transforms.{}", column),
                    format!("min {} is greater than max {}", min, max),
                ));
            }
        }
        Ok(())
    }
}

/// Rule sets keyed by source column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformRules(HashMap<String, TransformRuleSet>);

impl TransformRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, rules: TransformRuleSet) -> Self {
        self.0.insert(column.into(), rules);
        self
    }

    pub fn get(&self, column: &str) -> Option<&TransformRuleSet> {
        self.0.get(column)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.0
            .iter()
            .try_for_each(|(column, rules)| rules.validate(column))
    }
}
