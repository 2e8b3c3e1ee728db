//! Post-mapping payload checks.
//!
//! These run on the assembled payload, independent of which columns fed
//! it. Checks stop at the first violation, in this order:
//!
//! 1. the root object (`exercise`) exists and is an object
//! 2. each required key is present and neither null nor `""`
//! 3. each list key, when present, is a list (`null` becomes `[]`)
//!
//! A failing payload is never sent to the API.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use hevyload::validation::validate_payload;
//!
//! let mut payload = json!({
//!     "exercise": {
//!         "title": "Bench Press",
//!         "exercise_type": "weight_reps",
//!         "equipment_category": "barbell",
//!         "muscle_group": "chest",
//!         "other_muscles": null
//!     }
//! });
//! validate_payload(payload.as_object_mut().unwrap()).unwrap();
//! assert_eq!(payload["exercise"]["other_muscles"], json!([]));
//! ```

use serde_json::Value;

use crate::error::SchemaError;
use crate::models::Payload;

/// Shape a payload must have before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSchema {
    /// Top-level key holding the resource object.
    pub root: String,
    /// Keys under `root` that must be non-empty.
    pub required: Vec<String>,
    /// Keys under `root` that must be lists when present.
    pub lists: Vec<String>,
}

impl PayloadSchema {
    /// Schema for the exercise template endpoint.
    pub fn exercise() -> Self {
        Self {
            root: "exercise".to_string(),
            required: ["title", "exercise_type", "equipment_category", "muscle_group"]
                .into_iter()
                .map(String::from)
                .collect(),
            lists: vec!["other_muscles".to_string()],
        }
    }

    /// Check `payload`, normalising null list keys to `[]` in place.
    ///
    /// # Errors
    /// [`SchemaError`] naming the first rule the payload breaks.
    pub fn validate(&self, payload: &mut Payload) -> Result<(), SchemaError> {
        let root = match payload.get_mut(&self.root) {
            Some(Value::Object(obj)) => obj,
            _ => return Err(SchemaError(format!("missing {} object", self.root))),
        };

        for key in &self.required {
            match root.get(key) {
                None | Some(Value::Null) => return Err(self.missing(key)),
                Some(Value::String(s)) if s.is_empty() => return Err(self.missing(key)),
                Some(_) => {}
            }
        }

        for key in &self.lists {
            let Some(slot) = root.get_mut(key) else {
                continue;
            };
            match slot {
                Value::Array(_) => {}
                Value::Null => *slot = Value::Array(Vec::new()),
                _ => {
                    return Err(SchemaError(format!(
                        "{}.{} must be a list",
                        self.root, key
                    )))
                }
            }
        }

        Ok(())
    }

    fn missing(&self, key: &str) -> SchemaError {
        SchemaError(format!("missing {}.{}", self.root, key))
    }
}

impl Default for PayloadSchema {
    fn default() -> Self {
        Self::exercise()
    }
}

/// Validate against the exercise schema.
pub fn validate_payload(payload: &mut Payload) -> Result<(), SchemaError> {
    PayloadSchema::exercise().validate(payload)
}
