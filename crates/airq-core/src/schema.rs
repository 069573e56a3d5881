// crates/airq-core/src/schema.rs

use polars::prelude::*;
use serde::Serialize;

use crate::error::{PipelineError, Result};

pub const CITY_COLUMN: &str = "city";
pub const COUNTRY_COLUMN: &str = "country";

/// A recognized year column: the literal header label and its integer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearLabel {
    pub label: String,
    pub year: i32,
}

/// Validates the raw header and extracts the recognized year columns,
/// sorted ascending by year.
///
/// Any header whose trimmed text parses as an integer is treated as a year
/// column; everything else is passed through untouched.
pub fn inspect_schema(df: &DataFrame) -> Result<Vec<YearLabel>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for required in [CITY_COLUMN, COUNTRY_COLUMN] {
        if !names.iter().any(|name| name == required) {
            return Err(PipelineError::MissingColumn(required));
        }
    }

    let mut years: Vec<YearLabel> = names
        .iter()
        .filter_map(|name| {
            name.trim()
                .parse::<i32>()
                .ok()
                .map(|year| YearLabel {
                    label: name.clone(),
                    year,
                })
        })
        .collect();

    if years.is_empty() {
        return Err(PipelineError::NoYearColumns);
    }

    years.sort_by_key(|label| label.year);
    Ok(years)
}

/// Finds the header label for a year, rejecting years outside the
/// recognized set.
pub fn resolve_year(years: &[YearLabel], year: i32) -> Result<&YearLabel> {
    years
        .iter()
        .find(|label| label.year == year)
        .ok_or(PipelineError::UnknownYear(year))
}
