//! Record identifiers.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of decimal digits in a generated identifier.
pub const ID_DIGITS: usize = 14;

/// Primary key value of a record.
///
/// Generated ids are 14-digit integers taken from the decimal form of a
/// random 128-bit UUID. Generation is stateless, so uniqueness is
/// probabilistic rather than guaranteed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wraps a raw integer.
    #[inline]
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Derives an identifier from the leading decimal digits of a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        let digits = uuid.as_u128().to_string();
        let id = digits
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(ID_DIGITS)
            .fold(0i64, |acc, b| acc * 10 + i64::from(b - b'0'));
        Self(id)
    }

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Coerces a JSON value to an identifier.
    ///
    /// Integers pass through, booleans become 0/1, floats are truncated and
    /// strings are parsed as base-10 integers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for values with no integer reading.
    pub fn coerce(value: &Value) -> CoreResult<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self(i))
                } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                    if f.trunc() >= i64::MIN as f64 && f.trunc() <= i64::MAX as f64 {
                        Ok(Self(f.trunc() as i64))
                    } else {
                        Err(CoreError::invalid_input(format!("id out of range: {n}")))
                    }
                } else {
                    Err(CoreError::invalid_input(format!("id out of range: {n}")))
                }
            }
            Value::Bool(b) => Ok(Self(i64::from(*b))),
            Value::String(s) => s.parse(),
            other => Err(CoreError::invalid_input(format!(
                "id must be an integer, got {other}"
            ))),
        }
    }

    /// Returns true when a stored primary key value names this id.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i == self.0,
                None => n.as_f64() == Some(self.0 as f64),
            },
            _ => false,
        }
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| CoreError::invalid_input(format!("id must be an integer, got {s:?}")))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RecordId> for i64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::from(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_have_fixed_width() {
        for _ in 0..100 {
            let id = RecordId::generate();
            assert_eq!(id.to_string().len(), ID_DIGITS);
        }
    }

    #[test]
    fn from_uuid_takes_leading_digits() {
        let uuid = Uuid::from_u128(123_456_789_012_345_678_901_234_567_890);
        assert_eq!(RecordId::from_uuid(uuid).as_i64(), 12_345_678_901_234);
    }

    #[test]
    fn short_uuids_are_padded() {
        let uuid = Uuid::from_u128(42);
        assert_eq!(RecordId::from_uuid(uuid).as_i64(), 42_000_000_000_000);
    }

    #[test]
    fn new_is_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn coerce() {
        assert_eq!(RecordId::coerce(&json!(7)).unwrap(), RecordId::new(7));
        assert_eq!(RecordId::coerce(&json!("  12 ")).unwrap(), RecordId::new(12));
        assert_eq!(RecordId::coerce(&json!(3.9)).unwrap(), RecordId::new(3));
        assert_eq!(RecordId::coerce(&json!(true)).unwrap(), RecordId::new(1));
        assert!(RecordId::coerce(&json!("abc")).is_err());
        assert!(RecordId::coerce(&json!(null)).is_err());
        assert!(RecordId::coerce(&json!([1])).is_err());
    }

    #[test]
    fn matches_stored_numbers_only() {
        let id = RecordId::new(5);
        assert!(id.matches(&json!(5)));
        assert!(id.matches(&json!(5.0)));
        assert!(!id.matches(&json!("5")));
        assert!(!id.matches(&json!(6)));
    }

    #[test]
    fn serializes_as_plain_integer() {
        let id = RecordId::new(10_000_000_000_001);
        assert_eq!(serde_json::to_string(&id).unwrap(), "10000000000001");
        assert_eq!(Value::from(id), json!(10_000_000_000_001_i64));
    }
}
