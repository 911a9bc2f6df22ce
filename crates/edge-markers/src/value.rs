//! Marker values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single marker value as read from a marker source.
///
/// Comparison is strict: `Text("1")` and `Number(1)` are different values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerValue {
    /// Textual marker (the common case for cookies).
    Text(String),
    /// Numeric marker.
    Number(serde_json::Number),
}

impl MarkerValue {
    /// Create a text marker value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a numeric marker value.
    pub fn number(value: impl Into<serde_json::Number>) -> Self {
        Self::Number(value.into())
    }

    /// Get the text value, if this is a text marker.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Parse a raw string.
    ///
    /// Only canonical integers become numbers: the number must print back as
    /// exactly `raw`. Anything else, including `007`, `+7`, floats and integers
    /// out of `i64` range, stays text so distinct inputs never compare equal.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(i) if i.to_string() == raw => Self::Number(i.into()),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for MarkerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MarkerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for MarkerValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for MarkerValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for MarkerValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

/// Error parsing a `name=value` marker pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkerParseError {
    #[error("marker `{0}` is missing `=value`")]
    MissingValue(String),

    #[error("marker name is empty in `{0}`")]
    EmptyName(String),
}

/// Parse a `name=value` pair.
///
/// The value goes through [`MarkerValue::parse`], so `count=3` yields a number.
pub fn parse_marker_pair(pair: &str) -> Result<(String, MarkerValue), MarkerParseError> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| MarkerParseError::MissingValue(pair.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(MarkerParseError::EmptyName(pair.to_string()));
    }

    Ok((name.to_string(), MarkerValue::parse(value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_number_are_distinct() {
        assert_ne!(MarkerValue::text("1"), MarkerValue::from(1i64));
        assert_eq!(MarkerValue::from(1i64), MarkerValue::number(1i64));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(MarkerValue::parse("42"), MarkerValue::from(42i64));
        assert_eq!(MarkerValue::parse("-3"), MarkerValue::from(-3i64));
        assert_eq!(MarkerValue::parse("cart123"), MarkerValue::text("cart123"));
        assert_eq!(MarkerValue::parse("1.5"), MarkerValue::text("1.5"));
    }

    #[test]
    fn test_parse_keeps_non_canonical_numbers_as_text() {
        assert_eq!(MarkerValue::parse("007"), MarkerValue::text("007"));
        assert_eq!(MarkerValue::parse("+7"), MarkerValue::text("+7"));
        assert_eq!(MarkerValue::parse("-0"), MarkerValue::text("-0"));
        assert_ne!(MarkerValue::parse("007"), MarkerValue::parse("7"));

        // Past i64 and too close together for a float to tell apart
        let a = MarkerValue::parse("12345678901234567890");
        let b = MarkerValue::parse("12345678901234567891");
        assert_eq!(a, MarkerValue::text("12345678901234567890"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_untagged_serialization() {
        assert_eq!(serde_json::to_string(&MarkerValue::text("a")).unwrap(), r#""a""#);
        assert_eq!(serde_json::to_string(&MarkerValue::from(7i64)).unwrap(), "7");

        let v: MarkerValue = serde_json::from_str("7").unwrap();
        assert_eq!(v, MarkerValue::from(7i64));
    }

    #[test]
    fn test_parse_marker_pair() {
        let (name, value) = parse_marker_pair("cart=cart123").unwrap();
        assert_eq!(name, "cart");
        assert_eq!(value, MarkerValue::text("cart123"));

        // Only the first `=` splits
        let (_, value) = parse_marker_pair("token=a=b").unwrap();
        assert_eq!(value, MarkerValue::text("a=b"));
    }

    #[test]
    fn test_parse_marker_pair_errors() {
        assert_eq!(
            parse_marker_pair("cart"),
            Err(MarkerParseError::MissingValue("cart".to_string()))
        );
        assert_eq!(
            parse_marker_pair("=x"),
            Err(MarkerParseError::EmptyName("=x".to_string()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(MarkerValue::text("abc").to_string(), "abc");
        assert_eq!(MarkerValue::from(12i64).to_string(), "12");
    }
}
