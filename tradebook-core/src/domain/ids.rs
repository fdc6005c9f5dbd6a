use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiers arrive from the persistence layer as serial integers or as
/// opaque strings; both normalise to a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Unique identifier of a single trade action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct ActionId(pub String);

impl From<RawId> for ActionId {
    fn from(raw: RawId) -> Self {
        Self(raw.into_string())
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backtest a trade action belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct BacktestId(pub String);

impl From<RawId> for BacktestId {
    fn from(raw: RawId) -> Self {
        Self(raw.into_string())
    }
}

impl From<&str> for BacktestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BacktestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BacktestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
