//! Serde for `f64` fields that may be non-finite.
//!
//! JSON has no NaN or infinity; serde_json writes them as `null` and then
//! refuses to read `null` back into an `f64`. Fields using this module
//! write `"NaN"`, `"Infinity"` or `"-Infinity"` instead, and read those
//! strings, plain numbers or `null` (as NaN).
//!
//! ```ignore
//! #[serde(with = "tradebook_core::unbounded")]
//! pub profit_factor: f64,
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(f64::NAN),
        Some(Raw::Number(v)) => Ok(v),
        Some(Raw::Text(s)) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(D::Error::custom(format!(
                "expected a number, \"NaN\" or \"Infinity\", got {other:?}"
            ))),
        },
    }
}
