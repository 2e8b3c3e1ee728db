//! Row → payload mapping.
//!
//! A [`FieldMapping`] sends each source column to a dotted destination
//! path. Entries are applied in declaration order, so when two paths
//! collide the later entry wins.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::FieldError;
use crate::models::{Cell, Payload, Row};

use super::path::set_path;
use super::rules::TransformRules;
use super::stages::apply_rules;

// =============================================================================
// Field mapping
// =============================================================================

/// Ordered column → dotted path mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping entry. A repeated column replaces the earlier path.
    pub fn with(mut self, column: impl Into<String>, path: impl Into<String>) -> Self {
        let column = column.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((column, path)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, p)| (c.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapped columns that are not among `headers`.
    pub fn missing_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        self.iter()
            .map(|(c, _)| c)
            .filter(|c| !headers.iter().any(|h| h == c))
            .collect()
    }
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = FieldMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column name to dotted path")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = FieldMapping::new();
                while let Some((column, path)) = access.next_entry::<String, String>()? {
                    mapping = mapping.with(column, path);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

// =============================================================================
// Required fields
// =============================================================================

/// Columns that must hold a value before a row is mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredFields(Vec<String>);

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !out.contains(&field) {
                out.push(field);
            }
        }
        Self(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Required columns whose value is absent, null or the empty string.
///
/// Zero, `0.0` and `false` count as present. An empty result means the row
/// may proceed.
pub fn check_required(row: &Row, required: &RequiredFields) -> Vec<String> {
    required
        .iter()
        .filter(|field| row.get(field).map_or(true, Cell::is_empty))
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Mapping
// =============================================================================

/// Build a payload from `row`.
///
/// Columns absent from the row map to `null`. Columns without rules pass
/// through unchanged.
///
/// # Errors
/// The first column whose transform fails, as a [`FieldError`].
pub fn map_row(
    row: &Row,
    mapping: &FieldMapping,
    rules: &TransformRules,
) -> Result<Payload, FieldError> {
    let mut payload = Payload::new();

    for (column, path) in mapping.iter() {
        let cell = row.get(column).cloned().unwrap_or(Cell::Null);
        let value = match rules.get(column) {
            Some(column_rules) if !column_rules.is_noop() => apply_rules(&cell, column_rules)
                .map_err(|e| e.in_column(column))?
                .to_json(),
            _ => cell.to_json(),
        };
        set_path(&mut payload, path, value);
    }

    Ok(payload)
}
