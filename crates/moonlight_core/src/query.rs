//! Record matching.
//!
//! A query is a non-empty JSON object. A record matches when it carries
//! every query key with an equal value; extra record fields are ignored.

use crate::error::{CoreError, CoreResult};
use serde_json::{Map, Value};

/// A stored record: an ordered mapping from field name to JSON value.
pub type Record = Map<String, Value>;

/// A validated equality query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    fields: Map<String, Value>,
}

impl Query {
    /// Validates a JSON value as a query.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for non-objects and `EmptyQuery` for `{}`.
    pub fn from_value(value: &Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) if map.is_empty() => Err(CoreError::EmptyQuery),
            Value::Object(map) => Ok(Self { fields: map.clone() }),
            other => Err(CoreError::invalid_input(format!(
                "query must be an object, got {}",
                type_name(other)
            ))),
        }
    }

    /// Builds a single-field query.
    pub fn field(key: impl Into<String>, value: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(key.into(), value);
        Self { fields }
    }

    /// Returns true if `record` satisfies every query field.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.fields.iter().all(|(key, expected)| {
            record
                .get(key)
                .is_some_and(|actual| values_equal(actual, expected))
        })
    }

    /// Returns the query fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Compares two JSON values.
///
/// Numbers compare by numeric value so `1` equals `1.0`; every other kind
/// compares structurally. Booleans never equal numbers.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Returns true for null, false, zero and empty strings or containers.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Human-readable JSON type name, used in error messages.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
