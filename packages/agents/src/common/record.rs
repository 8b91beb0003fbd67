//! Loosely-typed table rows.
//!
//! Rows come back from the store as JSON objects. Stages read them through
//! [`RecordExt`], whose accessors never fail: a missing or malformed field
//! reads as `None` (or an empty list) so one bad row degrades a stage instead
//! of aborting it.

use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single table row, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Convert a JSON value into a row. Anything other than an object yields an empty row.
pub fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Primary or foreign key of a row.
///
/// Tables mix UUID, text and integer keys, so the id keeps its JSON form.
/// Equality filters must bind the original value (`5` and `"5"` differ).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Value);

impl RecordId {
    /// Accepts non-empty strings and numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(value.clone())),
            Value::Number(_) => Some(Self(value.clone())),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        self.0.clone()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

/// Lenient field accessors for [`Record`].
pub trait RecordExt {
    /// String field, `None` when absent, null, not a string or blank.
    fn str_field(&self, key: &str) -> Option<&str>;

    /// String field with a fallback for absent/blank values.
    fn text_or(&self, key: &str, default: &str) -> String {
        self.str_field(key).unwrap_or(default).to_string()
    }

    /// Number field; numeric strings are accepted.
    fn f64_field(&self, key: &str) -> Option<f64>;

    /// Integer field; integral floats and numeric strings are accepted.
    fn i64_field(&self, key: &str) -> Option<i64>;

    fn bool_field(&self, key: &str) -> Option<bool>;

    /// Array of strings. Non-string elements are dropped; a non-array reads as empty.
    fn str_list(&self, key: &str) -> Vec<String>;

    /// RFC 3339 timestamp. Naive timestamps are read as UTC.
    fn datetime_field(&self, key: &str) -> Option<DateTime<Utc>>;

    fn id_field(&self, key: &str) -> Option<RecordId>;
}

impl RecordExt for Record {
    fn str_field(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn f64_field(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    fn i64_field(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    fn str_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn datetime_field(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.str_field(key)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    fn id_field(&self, key: &str) -> Option<RecordId> {
        self.get(key).and_then(RecordId::from_value)
    }
}
