//! Cleaning strategies.
//!
//! Two strategies share the same load/serialize/publish driver:
//! - [`CleaningStrategy::FilterNormalize`]: drop rows whose `price` is outside
//!   an inclusive range, then normalize `last_review` to a date.
//! - [`CleaningStrategy::NullFill`]: replace missing `last_review` and
//!   `reviews_per_month` values with fixed defaults.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates::{has_time_of_day, parse_date};
use crate::error::{CleaningError, Result};
use crate::table::{Cell, Table};

pub const PRICE: &str = "price";
pub const LAST_REVIEW: &str = "last_review";
pub const REVIEWS_PER_MONTH: &str = "reviews_per_month";

/// Value written into missing `last_review` cells by the null-fill strategy.
pub const LAST_REVIEW_FILL: &str = "2000-01-01";
/// Value written into missing `reviews_per_month` cells by the null-fill strategy.
pub const REVIEWS_PER_MONTH_FILL: f64 = 0.0;

/// Which transformation the step applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CleaningStrategy {
    FilterNormalize { min_price: f64, max_price: f64 },
    NullFill,
}

/// Counts reported by [`CleaningStrategy::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    pub rows_in: usize,
    pub rows_out: usize,
    /// `last_review` cells converted to a date
    pub dates_normalized: usize,
    /// non-null `last_review` cells that failed to parse and became null
    pub dates_nulled: usize,
    /// cells replaced with a default value
    pub cells_filled: usize,
}

impl CleaningStrategy {
    /// Range filter with validated bounds.
    pub fn filter_normalize(min_price: f64, max_price: f64) -> Result<Self> {
        let strategy = CleaningStrategy::FilterNormalize {
            min_price,
            max_price,
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Reject non-finite or inverted price bounds.
    pub fn validate(&self) -> Result<()> {
        if let CleaningStrategy::FilterNormalize {
            min_price,
            max_price,
        } = *self
        {
            if !min_price.is_finite() || !max_price.is_finite() {
                return Err(CleaningError::Config(format!(
                    "price bounds must be finite numbers, got [{min_price}, {max_price}]"
                )));
            }
            if min_price > max_price {
                return Err(CleaningError::Config(format!(
                    "min_price ({min_price}) must not exceed max_price ({max_price})"
                )));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            CleaningStrategy::FilterNormalize { .. } => "filter_normalize",
            CleaningStrategy::NullFill => "null_fill",
        }
    }

    /// Transform `table` in place.
    pub fn apply(&self, table: &mut Table) -> CleaningStats {
        let rows_in = table.len();
        let mut stats = match *self {
            CleaningStrategy::FilterNormalize {
                min_price,
                max_price,
            } => filter_normalize(table, min_price, max_price),
            CleaningStrategy::NullFill => null_fill(table),
        };
        stats.rows_in = rows_in;
        stats.rows_out = table.len();
        stats
    }
}

fn filter_normalize(table: &mut Table, min_price: f64, max_price: f64) -> CleaningStats {
    let mut stats = CleaningStats::default();

    match table.column_index(PRICE) {
        Some(idx) => table.retain_rows(|row| {
            row[idx]
                .as_f64()
                .is_some_and(|p| min_price <= p && p <= max_price)
        }),
        None => table.retain_rows(|_| false),
    }

    if let Some(idx) = table.column_index(LAST_REVIEW) {
        let parsed: Vec<Option<NaiveDateTime>> = table
            .rows()
            .iter()
            .map(|row| match &row[idx] {
                Cell::Text(raw) => parse_date(raw),
                Cell::Date(d) | Cell::DateTime(d) => Some(*d),
                Cell::Null | Cell::Number(_) => None,
            })
            .collect();
        // One layout for the whole column
        let with_time = has_time_of_day(parsed.iter().flatten());

        for (cell, date) in table.column_cells_mut(idx).zip(parsed) {
            if matches!(cell, Cell::Text(_)) {
                if date.is_some() {
                    stats.dates_normalized += 1;
                } else {
                    stats.dates_nulled += 1;
                }
            }
            *cell = match date {
                Some(d) if with_time => Cell::DateTime(d),
                Some(d) => Cell::Date(d),
                None => Cell::Null,
            };
        }
    }
    stats
}

fn null_fill(table: &mut Table) -> CleaningStats {
    let mut stats = CleaningStats::default();
    let defaults = [
        (LAST_REVIEW, Cell::Text(LAST_REVIEW_FILL.to_string())),
        (REVIEWS_PER_MONTH, Cell::Number(REVIEWS_PER_MONTH_FILL)),
    ];

    for (column, default) in defaults {
        let Some(idx) = table.column_index(column) else {
            continue;
        };
        for cell in table.column_cells_mut(idx).filter(|c| c.is_null()) {
            *cell = default.clone();
            stats.cells_filled += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Table {
        Table::from_reader(text.as_bytes()).unwrap()
    }

    fn csv(table: &Table) -> String {
        let mut out = Vec::new();
        table
            .write_to(&mut out, crate::table::IndexColumn::Omit)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn filter_keeps_rows_in_inclusive_range() {
        let mut table = load("id,price,last_review\n1,50,2019-05-01\n2,5000,2019-06-01\n");
        let strategy = CleaningStrategy::filter_normalize(10.0, 1000.0).unwrap();
        let stats = strategy.apply(&mut table);

        assert_eq!(csv(&table), "id,price,last_review\n1,50,2019-05-01\n");
        assert_eq!(stats.rows_in, 2);
        assert_eq!(stats.rows_out, 1);
        assert_eq!(stats.dates_normalized, 1);
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let mut table = load("price\n9.99\n10\n350\n350.01\n");
        CleaningStrategy::filter_normalize(10.0, 350.0)
            .unwrap()
            .apply(&mut table);
        assert_eq!(csv(&table), "price\n10\n350\n");
    }

    #[test]
    fn filter_drops_null_and_non_numeric_prices() {
        let mut table = load("id,price\n1,\n2,free\n3,20\n");
        CleaningStrategy::filter_normalize(0.0, 100.0)
            .unwrap()
            .apply(&mut table);
        assert_eq!(csv(&table), "id,price\n3,20\n");
    }

    #[test]
    fn filter_without_price_column_drops_everything() {
        let mut table = load("id,last_review\n1,2019-01-01\n");
        let stats = CleaningStrategy::filter_normalize(0.0, 100.0)
            .unwrap()
            .apply(&mut table);
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["id", "last_review"]);
        assert_eq!(stats.rows_out, 0);
    }

    #[test]
    fn filter_normalizes_or_nulls_dates() {
        let mut table = load(
            "price,last_review\n10,2019/05/01\n10,not a date\n10,\n10,2019-05-01 08:30:00\n",
        );
        let stats = CleaningStrategy::filter_normalize(0.0, 100.0)
            .unwrap()
            .apply(&mut table);

        assert_eq!(
            csv(&table),
            "price,last_review\n10,2019-05-01 00:00:00\n10,\n10,\n10,2019-05-01 08:30:00\n"
        );
        assert_eq!(stats.dates_normalized, 2);
        assert_eq!(stats.dates_nulled, 1);
        for row in table.rows() {
            assert!(matches!(row[1], Cell::DateTime(_) | Cell::Null));
        }
    }

    #[test]
    fn filter_uses_one_date_layout_per_column() {
        let mut table = load("price,last_review\n50,2019-05-01\n60,2019-05-02 10:00:00\n");
        CleaningStrategy::filter_normalize(0.0, 100.0)
            .unwrap()
            .apply(&mut table);
        assert_eq!(
            csv(&table),
            "price,last_review\n50,2019-05-01 00:00:00\n60,2019-05-02 10:00:00\n"
        );

        let mut table = load("price,last_review\n50,2019-05-01\n60,05/02/2019\n");
        CleaningStrategy::filter_normalize(0.0, 100.0)
            .unwrap()
            .apply(&mut table);
        assert_eq!(csv(&table), "price,last_review\n50,2019-05-01\n60,2019-05-02\n");
    }

    #[test]
    fn filter_rejects_bad_bounds() {
        assert!(CleaningStrategy::filter_normalize(100.0, 10.0).is_err());
        assert!(CleaningStrategy::filter_normalize(f64::NAN, 10.0).is_err());
        assert!(CleaningStrategy::filter_normalize(0.0, f64::INFINITY).is_err());
        assert!(CleaningStrategy::filter_normalize(10.0, 10.0).is_ok());
    }

    #[test]
    fn null_fill_replaces_missing_values() {
        let mut table = load("id,last_review,reviews_per_month\n1,,\n2,2019-05-01,0.5\n");
        let stats = CleaningStrategy::NullFill.apply(&mut table);

        assert_eq!(
            csv(&table),
            "id,last_review,reviews_per_month\n1,2000-01-01,0\n2,2019-05-01,0.5\n"
        );
        assert_eq!(stats.cells_filled, 2);
        assert_eq!(stats.rows_in, stats.rows_out);
    }

    #[test]
    fn null_fill_is_idempotent() {
        let mut table = load("last_review,reviews_per_month,name\n,NA,a\n2019-01-01,,b\n,1.5,\n");
        CleaningStrategy::NullFill.apply(&mut table);
        let once = csv(&table);

        let mut again = load(&once);
        let stats = CleaningStrategy::NullFill.apply(&mut again);
        assert_eq!(csv(&again), once);
        assert_eq!(stats.cells_filled, 0);
    }

    #[test]
    fn null_fill_leaves_absent_columns_absent() {
        let mut table = load("id\n1\n");
        let stats = CleaningStrategy::NullFill.apply(&mut table);
        assert_eq!(table.columns(), ["id"]);
        assert_eq!(stats.cells_filled, 0);
    }

    #[test]
    fn strategy_serializes_with_tag() {
        let json = serde_json::to_value(CleaningStrategy::filter_normalize(10.0, 350.0).unwrap())
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"strategy": "filter_normalize", "min_price": 10.0, "max_price": 350.0})
        );
        assert_eq!(
            serde_json::to_value(CleaningStrategy::NullFill).unwrap(),
            serde_json::json!({"strategy": "null_fill"})
        );
    }
}
