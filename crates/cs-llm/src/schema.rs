//! Schema abstraction for structured generation.
//!
//! A [`Schema`] turns a parsed JSON value into a typed result or an
//! explanation of why it can't. The structured generator treats every schema
//! the same way, whatever the target structure.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of validating a value against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<T> {
    /// The value matches; carries the typed result.
    Valid(T),
    /// The value doesn't match; carries a description the model can act on.
    Invalid(String),
}

impl<T> Validation<T> {
    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the error detail for [`Invalid`](Self::Invalid).
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(detail) => Err(detail),
        }
    }

    /// Returns `true` for [`Valid`](Self::Valid).
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Validates JSON values into a typed output.
pub trait Schema: Send + Sync {
    /// The typed result of a successful validation.
    type Output: Send;

    /// Short name for logs (e.g. `"MigrationPlan"`).
    fn name(&self) -> &str;

    /// Validates `value`.
    fn validate(&self, value: Value) -> Validation<Self::Output>;
}

/// Extra constraint applied after deserialization succeeds.
pub type Check<T> = fn(&T) -> Result<(), String>;

/// A schema backed by a `serde` deserialization.
///
/// Field presence, field types, and enum values are all checked by the
/// derived `Deserialize` impl, and serde's error text (e.g.
/// ``missing field `summary` ``) becomes the validation detail. Constraints
/// that types can't express go in an optional [`Check`].
///
/// # Examples
///
/// ```
/// use cs_core::AnalysisResult;
/// use cs_llm::{Schema, SerdeSchema, Validation};
///
/// let schema = SerdeSchema::<AnalysisResult>::named("AnalysisResult");
/// let value = serde_json::json!({"patterns": [], "dependencies": []});
/// match schema.validate(value) {
///     Validation::Invalid(detail) => assert!(detail.contains("potentialIssues")),
///     Validation::Valid(_) => unreachable!(),
/// }
/// ```
pub struct SerdeSchema<T> {
    name: &'static str,
    check: Option<Check<T>>,
    _output: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    /// Creates a schema named after the output type.
    #[must_use]
    pub fn new() -> Self {
        let full = std::any::type_name::<T>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self::named(name)
    }

    /// Creates a schema with an explicit name.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            check: None,
            _output: PhantomData,
        }
    }

    /// Adds a constraint checked on every successfully deserialized value.
    #[must_use]
    pub fn with_check(mut self, check: Check<T>) -> Self {
        self.check = Some(check);
        self
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("name", &self.name)
            .field("check", &self.check.is_some())
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: DeserializeOwned + Send,
{
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self, value: Value) -> Validation<T> {
        let parsed: T = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => return Validation::Invalid(err.to_string()),
        };
        match self.check.map_or(Ok(()), |check| check(&parsed)) {
            Ok(()) => Validation::Valid(parsed),
            Err(detail) => Validation::Invalid(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use cs_core::{MigrationPlan, StepResult};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_name_is_type_name() {
        assert_eq!(SerdeSchema::<MigrationPlan>::new().name(), "MigrationPlan");
        assert_eq!(SerdeSchema::<StepResult>::named("step").name(), "step");
    }

    #[test]
    fn test_valid_value() {
        let schema = SerdeSchema::<StepResult>::new();
        let value = json!({"thought": "t", "code": "c", "status": "failed"});
        assert!(schema.validate(value).is_valid());
    }

    #[test]
    fn test_invalid_enum_value_is_reported() {
        let schema = SerdeSchema::<StepResult>::new();
        let value = json!({"thought": "t", "code": "c", "status": "done"});
        let detail = schema.validate(value).into_result().unwrap_err();
        assert!(detail.contains("unknown variant `done`"), "{detail}");
    }

    #[test]
    fn test_wrong_field_type_is_reported() {
        let schema = SerdeSchema::<MigrationPlan>::new();
        let value = json!({"steps": "none", "rationale": "r"});
        let detail = schema.validate(value).into_result().unwrap_err();
        assert!(detail.contains("invalid type"), "{detail}");
    }

    #[test]
    fn test_check_runs_after_deserialization() {
        let schema = SerdeSchema::<StepResult>::new().with_check(|step| {
            if step.code.trim().is_empty() {
                Err("code must not be empty".to_owned())
            } else {
                Ok(())
            }
        });

        let empty = json!({"thought": "t", "code": " ", "status": "success"});
        assert_eq!(
            schema.validate(empty),
            Validation::Invalid("code must not be empty".to_owned())
        );

        let filled = json!({"thought": "t", "code": "x = 1", "status": "success"});
        assert!(schema.validate(filled).is_valid());
    }
}
