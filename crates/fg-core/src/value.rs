//! Outcome values of discrete random variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One outcome in a variable's domain.
///
/// Serialized untagged, so JSON `true`, `3` and `"high"` map directly onto
/// `Bool`, `Int` and `Str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    /// Numeric reading of the outcome, if it has one (`true` is 1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Str(_) => None,
        }
    }

    /// Parse a command-line token: `true`/`false`, then integers, then text.
    pub fn parse_token(token: &str) -> Value {
        match token {
            "true" | "True" | "T" => return Value::Bool(true),
            "false" | "False" | "F" => return Value::Bool(false),
            _ => {}
        }
        match token.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Str(token.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_round_trip() {
        let values = vec![Value::Bool(true), Value::Int(-3), Value::from("low")];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[true,-3,"low"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn parse_token_prefers_bool_then_int() {
        assert_eq!(Value::parse_token("true"), Value::Bool(true));
        assert_eq!(Value::parse_token("F"), Value::Bool(false));
        assert_eq!(Value::parse_token("42"), Value::Int(42));
        assert_eq!(Value::parse_token("medium"), Value::from("medium"));
    }

    #[test]
    fn numeric_reading() {
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Int(6).as_f64(), Some(6.0));
        assert_eq!(Value::from("x").as_f64(), None);
    }
}
