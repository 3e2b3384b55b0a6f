//! Filter specifications
//!
//! A [`FilterSpec`] maps column names to criteria and is applied as a
//! conjunction across all named columns. The criterion shape is decided once
//! at construction time, from the JSON shape the caller supplies: an object
//! with `min`/`max` bounds, an array of allowed values, or a bare scalar.

use crate::table::CellValue;
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;

/// One column's filter criterion
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCriterion {
    /// Inclusive range; either bound may be absent
    Range {
        min: Option<CellValue>,
        max: Option<CellValue>,
    },
    /// Membership in a set of allowed values
    OneOf(Vec<CellValue>),
    /// Equality with a single value
    Equals(CellValue),
}

impl FilterCriterion {
    /// Whether a cell satisfies this criterion
    ///
    /// Comparisons are loose across `Int`/`Float`; an incomparable cell
    /// (including `Null`) never matches.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterCriterion::Range { min, max } => {
                if let Some(min) = min {
                    match cell.compare(min) {
                        Some(Ordering::Less) | None => return false,
                        _ => {}
                    }
                }
                if let Some(max) = max {
                    match cell.compare(max) {
                        Some(Ordering::Greater) | None => return false,
                        _ => {}
                    }
                }
                true
            }
            FilterCriterion::OneOf(allowed) => allowed.iter().any(|v| cell.loose_eq(v)),
            FilterCriterion::Equals(value) => cell.loose_eq(value),
        }
    }

    fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Object(map) => {
                let mut min = None;
                let mut max = None;
                for (key, bound) in map {
                    match key.as_str() {
                        "min" => min = Some(CellValue::try_from(bound)?),
                        "max" => max = Some(CellValue::try_from(bound)?),
                        other => return Err(format!("unknown range bound: {:?}", other)),
                    }
                }
                Ok(FilterCriterion::Range { min, max })
            }
            serde_json::Value::Array(items) => {
                let allowed = items
                    .into_iter()
                    .map(CellValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FilterCriterion::OneOf(allowed))
            }
            scalar => Ok(FilterCriterion::Equals(CellValue::try_from(scalar)?)),
        }
    }
}

impl<'de> Deserialize<'de> for FilterCriterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        FilterCriterion::from_json(value).map_err(serde::de::Error::custom)
    }
}

/// Column-name → criterion mapping, applied as a logical AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    criteria: Vec<(String, FilterCriterion)>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterCriterion)> {
        self.criteria.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn insert(&mut self, column: impl Into<String>, criterion: FilterCriterion) {
        let column = column.into();
        self.criteria.retain(|(name, _)| *name != column);
        self.criteria.push((column, criterion));
    }

    pub fn with_range(
        mut self,
        column: impl Into<String>,
        min: Option<CellValue>,
        max: Option<CellValue>,
    ) -> Self {
        self.insert(column, FilterCriterion::Range { min, max });
        self
    }

    pub fn with_one_of(mut self, column: impl Into<String>, allowed: Vec<CellValue>) -> Self {
        self.insert(column, FilterCriterion::OneOf(allowed));
        self
    }

    pub fn with_equals(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.insert(column, FilterCriterion::Equals(value));
        self
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(map) = value else {
            return Err(serde::de::Error::custom("filter spec must be an object"));
        };
        let mut spec = FilterSpec::new();
        for (column, criterion) in map {
            let criterion = FilterCriterion::from_json(criterion).map_err(serde::de::Error::custom)?;
            spec.insert(column, criterion);
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spec_shapes() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{
                "quantity": {"min": 1},
                "category": ["Electronics", "Furniture"],
                "status": "active"
            }"#,
        )
        .unwrap();

        let criteria: Vec<_> = spec.iter().collect();
        assert_eq!(criteria.len(), 3);
        assert!(matches!(
            spec.iter().find(|(name, _)| *name == "quantity").unwrap().1,
            FilterCriterion::Range { min: Some(_), max: None }
        ));
        assert!(matches!(
            spec.iter().find(|(name, _)| *name == "category").unwrap().1,
            FilterCriterion::OneOf(allowed) if allowed.len() == 2
        ));
        assert!(matches!(
            spec.iter().find(|(name, _)| *name == "status").unwrap().1,
            FilterCriterion::Equals(CellValue::Str(s)) if s == "active"
        ));
    }

    #[test]
    fn test_unknown_range_bound_is_rejected() {
        let result = serde_json::from_str::<FilterSpec>(r#"{"quantity": {"at_least": 1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_range_is_inclusive() {
        let criterion = FilterCriterion::Range {
            min: Some(CellValue::Int(0)),
            max: Some(CellValue::Int(10)),
        };
        assert!(criterion.matches(&CellValue::Int(0)));
        assert!(criterion.matches(&CellValue::Int(10)));
        assert!(criterion.matches(&CellValue::Float(9.5)));
        assert!(!criterion.matches(&CellValue::Int(-1)));
        assert!(!criterion.matches(&CellValue::Int(11)));
    }

    #[test]
    fn test_null_never_matches_a_range() {
        let criterion = FilterCriterion::Range {
            min: Some(CellValue::Int(0)),
            max: None,
        };
        assert!(!criterion.matches(&CellValue::Null));
    }

    #[test]
    fn test_membership_is_loose_across_numeric_kinds() {
        let criterion = FilterCriterion::OneOf(vec![CellValue::Int(2), CellValue::Int(4)]);
        assert!(criterion.matches(&CellValue::Float(2.0)));
        assert!(!criterion.matches(&CellValue::Int(3)));
    }

    #[test]
    fn test_incomparable_kinds_never_match() {
        let criterion = FilterCriterion::Range {
            min: Some(CellValue::Int(0)),
            max: None,
        };
        assert!(!criterion.matches(&CellValue::from("5")));
    }

    #[test]
    fn test_builder_replaces_existing_column() {
        let spec = FilterSpec::new()
            .with_equals("status", "active".into())
            .with_equals("status", "closed".into());
        let criteria: Vec<_> = spec.iter().collect();
        assert_eq!(criteria.len(), 1);
        assert!(matches!(
            criteria[0].1,
            FilterCriterion::Equals(CellValue::Str(s)) if s == "closed"
        ));
    }
}
