//! Exact decimal codec for nullable numeric wire fields.
//!
//! Prices, volumes and turnover arrive as JSON numbers (occasionally as strings, or
//! `""` when the API has nothing to report). They are decoded straight from
//! their textual digits into [`Decimal`] so no binary floating point is involved
//! and the scale survives (`2047.0` stays `2047.0`). `null`, a missing field and
//! an empty string all decode to `None`, which is distinct from `Some(0)`.
//!
//! Use with `#[serde(default, with = "crate::models::decimal::optional")]`.

use rust_decimal::Decimal;

fn parse_exact(text: &str) -> Result<Decimal, rust_decimal::Error> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str_exact(text)
    }
}

/// Serde adapter for `Option<Decimal>`.
pub mod optional {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
    use serde_json::{Number, Value};

    use super::parse_exact;

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(decimal) => Number::from_str(&decimal.to_string())
                .map_err(ser::Error::custom)?
                .serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => parse_exact(n.as_str()).map(Some).map_err(de::Error::custom),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_exact(s.trim()).map(Some).map_err(de::Error::custom),
            Some(other) => Err(de::Error::custom(format!(
                "expected a decimal number, got {other}"
            ))),
        }
    }
}
