//! Cell values and the coercions the function library relies on.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::area::Area;
use super::error::{FormulaError, Result};
use super::format::{format_date, format_delta, format_number};

/// A view of a rectangle of the table. Produced when a reference or range is
/// evaluated; never stored in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubTable {
    pub area: Area,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDateTime),
    Delta(#[serde(with = "delta_millis")] TimeDelta),
    Array(Vec<Value>),
    Table(SubTable),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for null and for the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The body of a formula (text after the leading `=`), if this is one.
    pub fn formula(&self) -> Option<&str> {
        match self {
            Value::Text(s) => s.strip_prefix('='),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::Delta(_) => "time delta",
            Value::Array(_) => "array",
            Value::Table(_) => "range",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

/// Coerce a scalar to a number. Blank is 0, booleans are 0/1, numeric text parses.
pub fn ensure_number(value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Number(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) if s.trim().is_empty() => Ok(0.0),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FormulaError::value(format!("'{}' is not a number", s))),
        other => Err(FormulaError::value(format!(
            "expected a number, got {}",
            other.type_name()
        ))),
    }
}

pub fn ensure_string(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Text(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Date(d) => Ok(format_date(d)),
        Value::Delta(d) => Ok(format_delta(d)),
        other => Err(FormulaError::value(format!(
            "expected a string, got {}",
            other.type_name()
        ))),
    }
}

pub fn ensure_boolean(value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(FormulaError::value(format!(
            "expected a boolean, got {}",
            other.type_name()
        ))),
    }
}

mod delta_millis {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(delta.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(TimeDelta::milliseconds(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    #[test]
    fn test_ensure_number_coercions() {
        assert_eq!(ensure_number(&Value::Null).unwrap(), 0.0);
        assert_eq!(ensure_number(&Value::Bool(true)).unwrap(), 1.0);
        assert_eq!(ensure_number(&Value::from(" 2.5 ")).unwrap(), 2.5);
        let err = ensure_number(&Value::from("abc")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn test_ensure_boolean_text() {
        assert!(ensure_boolean(&Value::from("TRUE")).unwrap());
        assert!(!ensure_boolean(&Value::Number(0.0)).unwrap());
        assert!(ensure_boolean(&Value::from("yes")).is_err());
    }

    #[test]
    fn test_ensure_string_formats_numbers() {
        assert_eq!(ensure_string(&Value::Number(3.0)).unwrap(), "3");
        assert_eq!(ensure_string(&Value::Bool(false)).unwrap(), "FALSE");
    }
}
