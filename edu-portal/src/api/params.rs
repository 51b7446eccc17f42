//! Request identifiers
//!
//! Student API clients send row ids as decimal strings (`"123456"`); JSON
//! numbers are accepted as well. Anything else fails deserialization, which
//! the handlers report as 400.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// Positive row id sent as a decimal string or a JSON number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowId(pub i64);

impl RowId {
    pub fn get(self) -> i64 {
        self.0
    }
}

struct RowIdVisitor;

impl<'de> Visitor<'de> for RowIdVisitor {
    type Value = RowId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a positive integer id or its decimal string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<RowId, E> {
        if value > 0 {
            Ok(RowId(value))
        } else {
            Err(E::custom(format!("id must be positive, got {}", value)))
        }
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<RowId, E> {
        i64::try_from(value)
            .map_err(|_| E::custom(format!("id {} is out of range", value)))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RowId, E> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::custom(format!("'{}' is not a decimal id", value)));
        }
        let parsed = value
            .parse::<i64>()
            .map_err(|_| E::custom(format!("id '{}' is out of range", value)))?;
        self.visit_i64(parsed)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RowIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<RowId, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_accepts_string_and_number() {
        assert_eq!(parse(json!("123456")).unwrap(), RowId(123456));
        assert_eq!(parse(json!(17)).unwrap(), RowId(17));
    }

    #[test]
    fn test_rejects_non_decimal() {
        for value in [json!("cl_123"), json!(""), json!("-4"), json!("1.5"), json!(0), json!(-3), json!(2.5), json!(null)] {
            assert!(parse(value.clone()).is_err(), "{} should be rejected", value);
        }
    }
}
