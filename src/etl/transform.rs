//! Cleaning, enrichment, and filtering of tables
//!
//! A [`Transformer`] never mutates its input; each operation returns a new
//! table. The instance keeps an ordered log of every transformation that
//! actually fired, reset only by constructing a new instance.

use crate::error::{EtlError, Result};
use crate::etl::filter::FilterSpec;
use crate::table::{stats, CellValue, Column, ColumnType, Table};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Hashable identity key for a cell, used to detect duplicate rows.
/// Floats key on their bit pattern, so `Int(2)` and `Float(2.0)` stay
/// distinct rows.
#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Int(i64),
    Float(u64),
    Str(&'a str),
    Date(NaiveDate),
    Null,
}

impl<'a> From<&'a CellValue> for CellKey<'a> {
    fn from(value: &'a CellValue) -> Self {
        match value {
            CellValue::Int(i) => CellKey::Int(*i),
            CellValue::Float(f) => CellKey::Float(f.to_bits()),
            CellValue::Str(s) => CellKey::Str(s),
            CellValue::Date(d) => CellKey::Date(*d),
            CellValue::Null => CellKey::Null,
        }
    }
}

/// Applies cleaning, enrichment, and filter operations to tables
#[derive(Debug, Default)]
pub struct Transformer {
    transformation_log: Vec<String>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove exact-duplicate rows and fill missing values
    ///
    /// Duplicates keep their first occurrence and the survivors' relative
    /// order. Numeric columns fill missing entries with the column median,
    /// other columns with the most frequent present value; a column with no
    /// present values is left as-is.
    pub fn clean(&mut self, table: &Table) -> Table {
        log::info!("Starting data cleaning process");

        let mut seen = HashSet::new();
        let keep: Vec<bool> = (0..table.row_count())
            .map(|idx| {
                let key: Vec<CellKey> = table.row(idx).into_iter().map(CellKey::from).collect();
                seen.insert(key)
            })
            .collect();
        let removed = keep.iter().filter(|k| !**k).count();
        let deduped = table.retain_rows(&keep);

        if removed > 0 {
            log::info!("Removed {} duplicate rows", removed);
            self.transformation_log
                .push(format!("Removed {} duplicates", removed));
        }

        let columns = deduped
            .columns()
            .iter()
            .map(|column| self.fill_missing(column))
            .collect();
        Table::from_columns_unchecked(columns)
    }

    fn fill_missing(&mut self, column: &Column) -> Column {
        if column.null_count() == 0 {
            return column.clone();
        }

        let (fill, ty, strategy) = if column.ty().is_numeric() {
            let Some(median) = stats::median(&column.numeric_values()) else {
                return column.clone();
            };
            // an integral median keeps an integer column integer
            if column.ty() == ColumnType::Int && median.fract() == 0.0 {
                (CellValue::Int(median as i64), ColumnType::Int, "median")
            } else {
                (CellValue::Float(median), ColumnType::Float, "median")
            }
        } else {
            let Some(mode) = mode_value(column.values()) else {
                return column.clone();
            };
            (mode, column.ty(), "mode")
        };

        log::info!("Filled missing values in {} with {}", column.name(), strategy);
        self.transformation_log.push(format!(
            "Filled missing values in {} with {}",
            column.name(),
            strategy
        ));

        let values = column
            .values()
            .iter()
            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
            .collect();
        Column::new(column.name(), ty, values)
    }

    /// Derive calculated columns from existing data
    ///
    /// Adds `total_value = quantity * price` when both columns exist, and
    /// `year`/`month`/`day_of_week` when a `date` column exists (parsing it
    /// to a date column in the process). Existing columns are never altered.
    ///
    /// # Errors
    /// [`EtlError::DateParse`] if any present
    /// `date` value fails to parse; the whole column fails, nothing is
    /// silently coerced to missing.
    pub fn enrich(&mut self, table: &Table) -> Result<Table> {
        let mut result = table.clone();

        if let (Some(quantity), Some(price)) = (table.column("quantity"), table.column("price")) {
            let values = quantity
                .values()
                .iter()
                .zip(price.values())
                .map(|(q, p)| match (q, p) {
                    (CellValue::Int(a), CellValue::Int(b)) => CellValue::Int(a * b),
                    _ => match (q.as_f64(), p.as_f64()) {
                        (Some(a), Some(b)) => CellValue::Float(a * b),
                        _ => CellValue::Null,
                    },
                })
                .collect();
            let ty = if quantity.ty() == ColumnType::Int && price.ty() == ColumnType::Int {
                ColumnType::Int
            } else {
                ColumnType::Float
            };
            result.push_column(Column::new("total_value", ty, values))?;
            log::info!("Added total_value column");
            self.transformation_log
                .push("Added total_value column".to_string());
        }

        if let Some(date_column) = table.column("date") {
            let dates = parse_dates(date_column)?;

            let as_cell = |f: &dyn Fn(&NaiveDate) -> CellValue| -> Vec<CellValue> {
                dates
                    .iter()
                    .map(|d| d.as_ref().map(f).unwrap_or(CellValue::Null))
                    .collect()
            };
            let year = as_cell(&|d| CellValue::Int(d.year() as i64));
            let month = as_cell(&|d| CellValue::Int(d.month() as i64));
            let weekday = as_cell(&|d| CellValue::Str(d.format("%A").to_string()));
            let parsed = as_cell(&|d| CellValue::Date(*d));

            result.insert_column(Column::new("date", ColumnType::Date, parsed))?;
            result.push_column(Column::new("year", ColumnType::Int, year))?;
            result.push_column(Column::new("month", ColumnType::Int, month))?;
            result.push_column(Column::new("day_of_week", ColumnType::Str, weekday))?;
            log::info!("Added date-based columns");
            self.transformation_log
                .push("Added date-based columns".to_string());
        }

        Ok(result)
    }

    /// Apply a filter spec as a row mask
    ///
    /// Columns named in the spec but absent from the table are silently
    /// ignored; survivor order is preserved.
    pub fn filter(&mut self, table: &Table, spec: &FilterSpec) -> Table {
        let mut result = table.clone();

        for (name, criterion) in spec.iter() {
            let Some(column) = result.column(name) else {
                continue;
            };
            let keep: Vec<bool> = column
                .values()
                .iter()
                .map(|cell| criterion.matches(cell))
                .collect();
            result = result.retain_rows(&keep);
            log::info!("Applied filter on {}", name);
            self.transformation_log
                .push(format!("Applied filter on {}", name));
        }

        result
    }

    /// Accumulated log of applied transformations, as an independent copy
    pub fn transformation_log(&self) -> Vec<String> {
        self.transformation_log.clone()
    }
}

/// Most frequent present value; ties go to the first encountered
fn mode_value(values: &[CellValue]) -> Option<CellValue> {
    let mut counts: Vec<(&CellValue, usize)> = Vec::new();
    for value in values.iter().filter(|v| !v.is_null()) {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&CellValue, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}

fn parse_dates(column: &Column) -> Result<Vec<Option<NaiveDate>>> {
    column
        .values()
        .iter()
        .map(|cell| match cell {
            CellValue::Null => Ok(None),
            CellValue::Date(d) => Ok(Some(*d)),
            CellValue::Str(s) => DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(Some)
                .ok_or_else(|| EtlError::DateParse {
                    column: column.name().to_string(),
                    value: s.clone(),
                }),
            other => Err(EtlError::DateParse {
                column: column.name().to_string(),
                value: other.to_string(),
            }),
        })
        .collect()
}

/// Apply the standard business transformation: clean, enrich, then drop
/// rows with a negative `quantity` (when that column exists)
///
/// Uses a fresh [`Transformer`]; its log is not exposed to the caller.
pub fn apply_business_rules(table: &Table) -> Result<Table> {
    let mut transformer = Transformer::new();

    let cleaned = transformer.clean(table);
    let enriched = transformer.enrich(&cleaned)?;

    let filtered = if enriched.has_column("quantity") {
        let spec = FilterSpec::new().with_range("quantity", Some(CellValue::Int(0)), None);
        transformer.filter(&enriched, &spec)
    } else {
        enriched
    };

    log::info!("Business rules applied successfully");
    Ok(filtered)
}

/// Lowercase column names and replace spaces and hyphens with underscores
///
/// # Errors
/// [`EtlError::DuplicateColumn`] if two
/// distinct names normalise to the same name; erroring beats silently
/// overwriting a column's data.
pub fn normalise_column_names(table: &Table) -> Result<Table> {
    let columns = table
        .columns()
        .iter()
        .map(|c| {
            let name = c.name().to_lowercase().replace([' ', '-'], "_");
            Column::new(name, c.ty(), c.values().to_vec())
        })
        .collect();

    let normalised = Table::from_columns(columns)?;
    log::info!("Column names normalised");
    Ok(normalised)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: Vec<Column>) -> Table {
        Table::from_columns(columns).unwrap()
    }

    fn int_col(name: &str, values: Vec<CellValue>) -> Column {
        Column::new(name, ColumnType::Int, values)
    }

    fn str_col(name: &str, values: Vec<CellValue>) -> Column {
        Column::new(name, ColumnType::Str, values)
    }

    #[test]
    fn test_clean_removes_duplicates_preserving_order() {
        let input = table(vec![
            str_col("name", vec!["a".into(), "b".into(), "a".into(), "c".into()]),
            int_col("n", vec![1.into(), 2.into(), 1.into(), 3.into()]),
        ]);

        let mut transformer = Transformer::new();
        let cleaned = transformer.clean(&input);

        assert_eq!(cleaned.row_count(), 3);
        assert_eq!(
            cleaned.column("name").unwrap().values(),
            &["a".into(), "b".into(), "c".into()]
        );
        assert_eq!(transformer.transformation_log(), vec!["Removed 1 duplicates"]);
    }

    #[test]
    fn test_clean_dedup_is_type_strict() {
        // same magnitude, different cell types: not duplicates
        let input = table(vec![Column::new(
            "n",
            ColumnType::Float,
            vec![
                CellValue::Int(2),
                CellValue::Float(2.0),
                CellValue::Float(2.0),
                CellValue::Null,
                CellValue::Null,
            ],
        )]);

        let mut transformer = Transformer::new();
        let cleaned = transformer.clean(&input);

        assert_eq!(cleaned.row_count(), 3);
        assert_eq!(
            cleaned.column("n").unwrap().values()[..2],
            [CellValue::Int(2), CellValue::Float(2.0)]
        );
        assert_eq!(
            transformer.transformation_log()[0],
            "Removed 2 duplicates"
        );
    }

    #[test]
    fn test_clean_is_idempotent() {
        let input = table(vec![int_col(
            "n",
            vec![1.into(), 1.into(), 2.into(), 2.into()],
        )]);

        let mut transformer = Transformer::new();
        let once = transformer.clean(&input);
        let twice = transformer.clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_without_missing_values_keeps_rows_intact() {
        let input = table(vec![
            str_col("name", vec!["a".into(), "b".into()]),
            int_col("n", vec![1.into(), 2.into()]),
        ]);

        let cleaned = Transformer::new().clean(&input);
        assert_eq!(cleaned, input);
    }

    #[test]
    fn test_clean_fills_numeric_with_median() {
        let input = table(vec![int_col(
            "n",
            vec![1.into(), CellValue::Null, 3.into(), 5.into()],
        )]);

        let mut transformer = Transformer::new();
        let cleaned = transformer.clean(&input);

        // median of {1, 3, 5} is 3
        assert_eq!(
            cleaned.column("n").unwrap().values(),
            &[1.into(), 3.into(), 3.into(), 5.into()]
        );
        assert_eq!(cleaned.column("n").unwrap().ty(), ColumnType::Int);
        assert_eq!(
            transformer.transformation_log(),
            vec!["Filled missing values in n with median"]
        );
    }

    #[test]
    fn test_clean_fractional_median_promotes_int_column() {
        let input = table(vec![int_col(
            "n",
            vec![1.into(), 2.into(), CellValue::Null, 4.into(), 7.into()],
        )]);

        let cleaned = Transformer::new().clean(&input);
        let column = cleaned.column("n").unwrap();
        assert_eq!(column.ty(), ColumnType::Float);
        assert_eq!(column.values()[2], CellValue::Float(3.0));
    }

    #[test]
    fn test_clean_fills_text_with_mode_first_encountered_tie() {
        let input = table(vec![str_col(
            "category",
            vec![
                "b".into(),
                "a".into(),
                CellValue::Null,
                "a".into(),
                "b".into(),
            ],
        )]);

        let cleaned = Transformer::new().clean(&input);
        // "b" and "a" both appear twice; "b" was seen first
        assert_eq!(cleaned.column("category").unwrap().values()[2], "b".into());
    }

    #[test]
    fn test_clean_leaves_all_null_column_unfilled() {
        let input = table(vec![
            int_col("n", vec![CellValue::Null, CellValue::Null]),
            str_col("s", vec!["x".into(), "y".into()]),
        ]);

        let mut transformer = Transformer::new();
        let cleaned = transformer.clean(&input);
        assert_eq!(cleaned.column("n").unwrap().null_count(), 2);
        assert!(transformer.transformation_log().is_empty());
    }

    #[test]
    fn test_enrich_adds_total_value() {
        let input = table(vec![
            int_col("quantity", vec![2.into(), CellValue::Null]),
            Column::new("price", ColumnType::Float, vec![5.0.into(), 3.0.into()]),
        ]);

        let enriched = Transformer::new().enrich(&input).unwrap();
        let total = enriched.column("total_value").unwrap();
        assert_eq!(total.ty(), ColumnType::Float);
        assert_eq!(total.values()[0], CellValue::Float(10.0));
        // missing operand yields missing result
        assert!(total.values()[1].is_null());
    }

    #[test]
    fn test_enrich_integer_product_stays_integer() {
        let input = table(vec![
            int_col("quantity", vec![2.into()]),
            int_col("price", vec![5.into()]),
        ]);

        let enriched = Transformer::new().enrich(&input).unwrap();
        assert_eq!(
            enriched.column("total_value").unwrap().values(),
            &[CellValue::Int(10)]
        );
    }

    #[test]
    fn test_enrich_derives_date_columns() {
        let input = table(vec![str_col(
            "date",
            vec!["2024-03-01".into(), CellValue::Null],
        )]);

        let enriched = Transformer::new().enrich(&input).unwrap();
        assert_eq!(enriched.column("date").unwrap().ty(), ColumnType::Date);
        assert_eq!(enriched.column("year").unwrap().values()[0], 2024.into());
        assert_eq!(enriched.column("month").unwrap().values()[0], 3.into());
        // 2024-03-01 was a Friday
        assert_eq!(
            enriched.column("day_of_week").unwrap().values()[0],
            "Friday".into()
        );
        assert!(enriched.column("year").unwrap().values()[1].is_null());
    }

    #[test]
    fn test_enrich_does_not_touch_other_columns() {
        let input = table(vec![
            str_col("name", vec!["a".into()]),
            int_col("quantity", vec![2.into()]),
            int_col("price", vec![3.into()]),
            str_col("date", vec!["2024-01-15".into()]),
        ]);

        let enriched = Transformer::new().enrich(&input).unwrap();
        for name in ["name", "quantity", "price"] {
            assert_eq!(enriched.column(name), input.column(name));
        }
        assert_eq!(
            enriched.column_names(),
            vec!["name", "quantity", "price", "date", "total_value", "year", "month", "day_of_week"]
        );
    }

    #[test]
    fn test_enrich_bad_date_fails_whole_column() {
        let input = table(vec![str_col(
            "date",
            vec!["2024-01-01".into(), "not-a-date".into()],
        )]);

        let result = Transformer::new().enrich(&input);
        assert!(matches!(
            result,
            Err(EtlError::DateParse { column, value }) if column == "date" && value == "not-a-date"
        ));
    }

    #[test]
    fn test_filter_empty_spec_is_noop() {
        let input = table(vec![int_col("n", vec![1.into(), 2.into()])]);
        let mut transformer = Transformer::new();
        let filtered = transformer.filter(&input, &FilterSpec::new());
        assert_eq!(filtered, input);
        assert!(transformer.transformation_log().is_empty());
    }

    #[test]
    fn test_filter_unknown_columns_are_ignored() {
        let input = table(vec![int_col("n", vec![1.into(), 2.into()])]);
        let spec = FilterSpec::new().with_equals("ghost", 1.into());
        let filtered = Transformer::new().filter(&input, &spec);
        assert_eq!(filtered, input);
    }

    #[test]
    fn test_filter_conjunction() {
        let input = table(vec![
            int_col("n", vec![1.into(), 5.into(), 9.into()]),
            str_col("category", vec!["a".into(), "a".into(), "b".into()]),
        ]);

        let spec = FilterSpec::new()
            .with_range("n", Some(2.into()), None)
            .with_one_of("category", vec!["a".into()]);

        let mut transformer = Transformer::new();
        let filtered = transformer.filter(&input, &spec);
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(filtered.column("n").unwrap().values(), &[5.into()]);
        assert_eq!(
            transformer.transformation_log(),
            vec!["Applied filter on n", "Applied filter on category"]
        );
    }

    #[test]
    fn test_transformation_log_is_an_independent_copy() {
        let mut transformer = Transformer::new();
        let input = table(vec![int_col("n", vec![1.into(), 1.into()])]);
        transformer.clean(&input);

        let mut log = transformer.transformation_log();
        log.push("tampered".to_string());
        assert_eq!(transformer.transformation_log().len(), 1);
    }

    #[test]
    fn test_apply_business_rules_scenario() {
        let input = table(vec![
            int_col("quantity", vec![2.into(), (-1).into()]),
            int_col("price", vec![5.into(), 3.into()]),
        ]);

        let result = apply_business_rules(&input).unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(
            result.column("total_value").unwrap().values(),
            &[CellValue::Int(10)]
        );
    }

    #[test]
    fn test_apply_business_rules_without_quantity_skips_filter() {
        let input = table(vec![str_col("name", vec!["a".into(), "b".into()])]);
        let result = apply_business_rules(&input).unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn test_normalise_column_names() {
        let input = table(vec![
            str_col("Product Name", vec!["a".into()]),
            int_col("Unit-Price", vec![1.into()]),
        ]);

        let normalised = normalise_column_names(&input).unwrap();
        assert_eq!(normalised.column_names(), vec!["product_name", "unit_price"]);
    }

    #[test]
    fn test_normalise_collision_is_an_error() {
        let input = table(vec![
            str_col("Total Value", vec!["a".into()]),
            str_col("total-value", vec!["b".into()]),
        ]);

        assert!(matches!(
            normalise_column_names(&input),
            Err(EtlError::DuplicateColumn(name)) if name == "total_value"
        ));
    }
}
