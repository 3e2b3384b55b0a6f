//! Cell values and column types
//!
//! A [`CellValue`] is one entry in a column. Missing entries are an explicit
//! [`CellValue::Null`] marker so every column always holds exactly one value
//! per row.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// The declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Str,
    Date,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }

    /// Type name used in the descriptive data summary
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Str => "str",
            ColumnType::Date => "date",
        }
    }
}

/// A single typed cell
///
/// Derived equality is strict (`Int(2) != Float(2.0)`) and is what row
/// deduplication uses. Filters go through [`CellValue::compare`], which
/// treats the two numeric variants as one domain.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Loose ordering: `Int` and `Float` compare as numbers, `Str` and
    /// `Date` compare within their own kind, everything else (including
    /// `Null`) is incomparable.
    pub fn compare(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Null, _) | (_, CellValue::Null) => None,
            (CellValue::Str(a), CellValue::Str(b)) => Some(a.cmp(b)),
            (CellValue::Date(a), CellValue::Date(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality under [`CellValue::compare`], so `2 == 2.0`
    pub fn loose_eq(&self, other: &CellValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// JSON representation; non-finite floats degrade to `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Int(i) => serde_json::Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Str(s) => serde_json::Value::from(s.as_str()),
            CellValue::Date(d) => serde_json::Value::from(d.format("%Y-%m-%d").to_string()),
            CellValue::Null => serde_json::Value::Null,
        }
    }
}

/// Textual form used by the CSV writer; `Null` renders as an empty field
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Str(s) => write!(f, "{}", s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Str(s) => serializer.serialize_str(s),
            CellValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        CellValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<serde_json::Value> for CellValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(CellValue::Null),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(CellValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(CellValue::Float(f))
                } else {
                    Err(format!("unrepresentable number: {}", n))
                }
            }
            serde_json::Value::String(s) => Ok(CellValue::Str(s)),
            other => Err(format!("unsupported cell value: {}", other)),
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Str(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Str(s)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_numeric_equality() {
        assert!(CellValue::Int(2).loose_eq(&CellValue::Float(2.0)));
        assert!(!CellValue::Int(2).loose_eq(&CellValue::Float(2.5)));
        // strict equality stays strict
        assert_ne!(CellValue::Int(2), CellValue::Float(2.0));
    }

    #[test]
    fn test_null_is_incomparable() {
        assert_eq!(CellValue::Null.compare(&CellValue::Null), None);
        assert_eq!(CellValue::Int(1).compare(&CellValue::Null), None);
    }

    #[test]
    fn test_cross_kind_is_incomparable() {
        let s = CellValue::from("10");
        assert_eq!(s.compare(&CellValue::Int(10)), None);
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Int(42).to_string(), "42");
    }

    #[test]
    fn test_date_serializes_as_string() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let json = serde_json::to_value(CellValue::Date(date)).unwrap();
        assert_eq!(json, serde_json::json!("2024-03-01"));
    }

    #[test]
    fn test_deserialize_scalars() {
        let v: CellValue = serde_json::from_str("5").unwrap();
        assert_eq!(v, CellValue::Int(5));
        let v: CellValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, CellValue::Float(2.5));
        let v: CellValue = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(v, CellValue::from("abc"));
        let v: CellValue = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_deserialize_rejects_nested() {
        assert!(serde_json::from_str::<CellValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<CellValue>("{\"a\": 1}").is_err());
    }
}
