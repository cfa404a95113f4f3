use serde_json::Value as Json;
use std::fmt;

/// Domain marker for "the source did not know", distinct from a missing value
pub const UNKNOWN: &str = "unknown";

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Number(f64),
    Flag(bool),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric reading of the cell; numeric text is accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// The literal "unknown" sentinel
    pub fn is_unknown(&self) -> bool {
        self.as_str() == Some(UNKNOWN)
    }

    /// Present and not the "unknown" sentinel
    pub fn is_known(&self) -> bool {
        !self.is_missing() && !self.is_unknown()
    }

    /// Convert a scalar JSON field into a cell
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Missing,
            Json::String(s) => Value::Text(s.clone()),
            Json::Bool(b) => Value::Flag(*b),
            Json::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Missing),
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Flag(true) => f.write_str("True"),
            Value::Flag(false) => f.write_str("False"),
        }
    }
}

/// Parse numeric text, accepting thousands separators ("1,358")
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Indicator cell during ingestion.
///
/// `Unset` means the record never mentioned the reference, which only becomes
/// `false` when the table is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorCell {
    #[default]
    Unset,
    Set(bool),
}

impl IndicatorCell {
    pub fn finalize(self) -> bool {
        match self {
            IndicatorCell::Unset => false,
            IndicatorCell::Set(b) => b,
        }
    }
}
