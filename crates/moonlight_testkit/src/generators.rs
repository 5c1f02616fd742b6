//! Property-based test generators using proptest.
//!
//! Generated values survive a trip through the data file unchanged: floats
//! are limited to quarters so their decimal form is exact.

use moonlight_core::{Record, DEFAULT_PRIMARY_KEY};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for field names other than the primary key.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("Invalid regex")
        .prop_filter("Field name must not be the primary key", |s| {
            s != DEFAULT_PRIMARY_KEY
        })
}

/// Strategy for scalar JSON values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-4_000i32..4_000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
        "\\PC{0,16}".prop_map(Value::String),
    ]
}

/// Strategy for nested JSON values up to depth 3.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

/// Strategy for non-empty records without a primary key.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(field_name_strategy(), json_value_strategy(), 1..6)
        .prop_map(|fields| fields.into_iter().collect::<Map<String, Value>>())
}

/// Strategy for a batch of records.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn records_are_non_empty_and_keyless(record in record_strategy()) {
            prop_assert!(!record.is_empty());
            prop_assert!(!record.contains_key(DEFAULT_PRIMARY_KEY));
        }

        #[test]
        fn values_survive_text(value in json_value_strategy()) {
            let text = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back, value);
        }
    }
}
