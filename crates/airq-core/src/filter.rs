// crates/airq-core/src/filter.rs

use polars::prelude::*;
use tracing::debug;

use crate::dataset::PollutionDataset;
use crate::error::{PipelineError, Result};
use crate::schema::{resolve_year, CITY_COLUMN, COUNTRY_COLUMN};

/// A dropdown-style choice: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.eq_ignore_ascii_case("all") => Selection::Only(name),
            _ => Selection::All,
        }
    }
}

/// An inclusive numeric bound on one recognized year's readings. Validated
/// at the boundary: the year must be recognized and min must not exceed max.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub year: i32,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub country: Selection,
    pub city: Selection,
    pub range: Option<RangeFilter>,
}

/// A filtered slice of the dataset. Both tables are fresh copies; the base
/// tables are never mutated.
#[derive(Debug)]
pub struct FilteredView {
    pub wide: DataFrame,
    pub long: DataFrame,
}

impl PollutionDataset {
    /// Applies every provided predicate (logical AND) to the wide table, then
    /// restricts the long table to the surviving (city, country) key set via
    /// a semi join so the two views stay referentially consistent.
    ///
    /// A null cell never satisfies a range predicate; it is excluded, not
    /// treated as zero.
    pub fn filter(&self, spec: &FilterSpec) -> Result<FilteredView> {
        let mut predicate: Option<Expr> = None;

        if let Selection::Only(country) = &spec.country {
            predicate = and_with(predicate, col(COUNTRY_COLUMN).eq(lit(country.clone())));
        }
        if let Selection::Only(city) = &spec.city {
            predicate = and_with(predicate, col(CITY_COLUMN).eq(lit(city.clone())));
        }
        if let Some(range) = &spec.range {
            if range.min > range.max {
                return Err(PipelineError::InvalidRange {
                    min: range.min,
                    max: range.max,
                });
            }
            let label = resolve_year(self.year_labels(), range.year)?;
            predicate = and_with(
                predicate,
                col(label.label.as_str())
                    .gt_eq(lit(range.min))
                    .and(col(label.label.as_str()).lt_eq(lit(range.max))),
            );
        }

        let wide = match predicate {
            Some(expr) => self.wide().clone().lazy().filter(expr).collect()?,
            None => self.wide().clone(),
        };

        let long = self
            .long()
            .clone()
            .lazy()
            .join(
                wide.clone().lazy().select([col(CITY_COLUMN), col(COUNTRY_COLUMN)]),
                [col(CITY_COLUMN), col(COUNTRY_COLUMN)],
                [col(CITY_COLUMN), col(COUNTRY_COLUMN)],
                JoinArgs::new(JoinType::Semi),
            )
            .collect()?;

        debug!(
            wide_rows = wide.height(),
            long_rows = long.height(),
            "applied filter"
        );

        Ok(FilteredView { wide, long })
    }

    /// The valid city choices for a country selection: exactly the cities
    /// present in wide rows matching that country, sorted and deduplicated.
    /// Rendering layers must re-derive this whenever the country changes so a
    /// stale city selection can never survive a country switch.
    pub fn city_options(&self, country: &Selection) -> Result<Vec<String>> {
        let df = match country {
            Selection::All => self.wide().clone(),
            Selection::Only(name) => self
                .wide()
                .clone()
                .lazy()
                .filter(col(COUNTRY_COLUMN).eq(lit(name.clone())))
                .collect()?,
        };

        collect_distinct(&df, CITY_COLUMN)
    }

    pub fn country_options(&self) -> Result<Vec<String>> {
        collect_distinct(self.wide(), COUNTRY_COLUMN)
    }
}

fn and_with(predicate: Option<Expr>, clause: Expr) -> Option<Expr> {
    Some(match predicate {
        Some(existing) => existing.and(clause),
        None => clause,
    })
}

fn collect_distinct(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut values: Vec<String> = df
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    Ok(values)
}
