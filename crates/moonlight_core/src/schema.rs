//! Declarative validation for request bodies.
//!
//! A [`Schema`] lists fields in order. Each field has an optional default,
//! used when the input lacks it, and a chain of [`Rule`]s applied in order.

use crate::query::{is_falsy, Record};
use serde_json::Value;
use thiserror::Error;

/// A check applied to one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The value must be present and truthy.
    Required,
    /// A non-empty value must have at least this many elements or characters.
    MinLength(usize),
    /// A non-empty value must have at most this many elements or characters.
    MaxLength(usize),
}

impl Rule {
    fn check(&self, value: &Value) -> Result<(), String> {
        match *self {
            Rule::Required if is_falsy(value) => Err("required field is empty".to_string()),
            Rule::Required => Ok(()),
            Rule::MinLength(min) => match length(value)? {
                Some(len) if len < min => {
                    Err(format!("value must be at least {min} characters long"))
                }
                _ => Ok(()),
            },
            Rule::MaxLength(max) => match length(value)? {
                Some(len) if len > max => {
                    Err(format!("value must be at most {max} characters long"))
                }
                _ => Ok(()),
            },
        }
    }
}

// Empty values skip length rules; `Required` covers them.
fn length(value: &Value) -> Result<Option<usize>, String> {
    if is_falsy(value) {
        return Ok(None);
    }
    match value {
        Value::String(s) => Ok(Some(s.chars().count())),
        Value::Array(a) => Ok(Some(a.len())),
        Value::Object(o) => Ok(Some(o.len())),
        _ => Err("value has no length".to_string()),
    }
}

/// One field of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    default: Option<Value>,
    rules: Vec<Rule>,
}

impl FieldSpec {
    /// Creates a field with no default and no rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            rules: Vec::new(),
        }
    }

    /// Value used when the input lacks the field.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Appends a rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct SchemaError {
    /// Offending field.
    pub field: String,
    /// What was wrong.
    pub message: String,
}

/// Ordered set of field specifications.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates `input` and returns the normalized object.
    ///
    /// The output holds exactly the schema's fields, in schema order. A field
    /// missing from the input takes its default, or null.
    pub fn validate(&self, input: &Value) -> Result<Record, SchemaError> {
        let empty = Record::new();
        let object = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(SchemaError {
                    field: String::new(),
                    message: "body must be a JSON object".to_string(),
                })
            }
        };

        let mut out = Record::new();
        for spec in &self.fields {
            let value = object
                .get(&spec.name)
                .or(spec.default.as_ref())
                .cloned()
                .unwrap_or(Value::Null);

            for rule in &spec.rules {
                rule.check(&value).map_err(|message| SchemaError {
                    field: spec.name.clone(),
                    message,
                })?;
            }
            out.insert(spec.name.clone(), value);
        }
        Ok(out)
    }
}

/// Outcome of [`required_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldReport {
    /// Fields absent from the body.
    pub missing: Vec<String>,
    /// Fields present but empty.
    pub empty: Vec<String>,
}

impl FieldReport {
    /// Returns true if every field is present and non-empty.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.empty.is_empty()
    }
}

/// Checks that `body` carries each of `fields` with a truthy value.
#[must_use]
pub fn required_fields(body: &Value, fields: &[&str]) -> FieldReport {
    let mut report = FieldReport::default();
    for &field in fields {
        match body.get(field) {
            None => report.missing.push(field.to_string()),
            Some(value) if is_falsy(value) => report.empty.push(field.to_string()),
            Some(_) => {}
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Schema {
        Schema::new()
            .field(
                FieldSpec::new("username")
                    .rule(Rule::Required)
                    .rule(Rule::MinLength(3))
                    .rule(Rule::MaxLength(8)),
            )
            .field(FieldSpec::new("role").default_value(json!("viewer")))
    }

    #[test]
    fn fills_defaults_in_order() {
        let out = user_schema()
            .validate(&json!({"extra": 1, "username": "ann"}))
            .unwrap();
        assert_eq!(Value::Object(out), json!({"username": "ann", "role": "viewer"}));
    }

    #[test]
    fn required_rejects_empty() {
        let err = user_schema().validate(&json!({"username": ""})).unwrap_err();
        assert_eq!(err.field, "username");

        let err = user_schema().validate(&Value::Null).unwrap_err();
        assert_eq!(err.field, "username");
    }

    #[test]
    fn length_bounds() {
        let schema = user_schema();
        assert!(schema.validate(&json!({"username": "an"})).is_err());
        assert!(schema.validate(&json!({"username": "annabella"})).is_err());
        assert!(schema.validate(&json!({"username": "annabell"})).is_ok());
        assert!(schema.validate(&json!({"username": 42})).is_err());
    }

    #[test]
    fn length_skips_empty_values() {
        let schema = Schema::new().field(FieldSpec::new("tags").rule(Rule::MinLength(2)));
        assert!(schema.validate(&json!({})).is_ok());
        assert!(schema.validate(&json!({"tags": []})).is_ok());
        assert!(schema.validate(&json!({"tags": ["a"]})).is_err());
    }

    #[test]
    fn non_object_body() {
        assert!(user_schema().validate(&json!([1])).is_err());
    }

    #[test]
    fn report_splits_missing_and_empty() {
        let report = required_fields(&json!({"username": "", "x": 1}), &["username", "password"]);
        assert_eq!(report.missing, vec!["password"]);
        assert_eq!(report.empty, vec!["username"]);
        assert!(!report.is_ok());

        assert!(required_fields(&json!({"a": 1}), &["a"]).is_ok());
    }
}
