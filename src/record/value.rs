//! Scalar cell values and their CSV text form.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Timestamp format used when writing CSV output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Date format used for the `Day` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted timestamp layouts when reading, most specific first
const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single cell of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

/// How a column's raw text should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
    Date,
    /// No declared type, infer per cell
    Inferred,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }

    /// Parse raw CSV text as the given column type.
    ///
    /// Empty text is always `Null`. Integer columns also accept floats with
    /// no fractional part (`1234.0`), which is how pandas writes integer
    /// columns that contain missing values.
    pub fn parse(raw: &str, column_type: ColumnType) -> Result<Value, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }

        match column_type {
            ColumnType::Int => parse_int(raw)
                .map(Value::Int)
                .ok_or_else(|| format!("expected integer, got '{}'", raw)),
            ColumnType::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("expected number, got '{}'", raw)),
            ColumnType::Text => Ok(Value::Text(raw.to_string())),
            ColumnType::Bool => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| format!("expected boolean, got '{}'", raw)),
            ColumnType::Timestamp => parse_timestamp(raw)
                .map(Value::Timestamp)
                .ok_or_else(|| format!("expected timestamp, got '{}'", raw)),
            ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .or_else(|| parse_timestamp(raw).map(|ts| ts.date()))
                .map(Value::Date)
                .ok_or_else(|| format!("expected date, got '{}'", raw)),
            ColumnType::Inferred => Ok(Value::infer(raw)),
        }
    }

    /// Best-effort typing for columns without a declared type
    pub fn infer(raw: &str) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        match raw {
            "true" | "True" | "TRUE" => return Value::Bool(true),
            "false" | "False" | "FALSE" => return Value::Bool(false),
            _ => {}
        }
        if let Some(ts) = parse_timestamp(raw) {
            return Value::Timestamp(ts);
        }
        Value::Text(raw.to_string())
    }

    /// Text written to a CSV cell. Nulls become empty cells.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NaN"),
            Value::Float(v) => write!(f, "{:.3}", v),
            other => write!(f, "{}", other.to_csv_field()),
        }
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "1" | "1.0" => Some(true),
        "false" | "f" | "no" | "0" | "0.0" => Some(false),
        _ => None,
    }
}

/// Parse a timestamp in any accepted layout, including date-only values
/// (pandas drops the time part when every value in a column is midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for format in TIMESTAMP_INPUT_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
