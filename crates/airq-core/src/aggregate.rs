// crates/airq-core/src/aggregate.rs
//
// Derived aggregates over a wide view. Every function accepts any wide table
// produced by the pipeline (the base table or a filtered subset) and never
// mutates its input. "No data" is always an empty value, never an error.

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::schema::{resolve_year, YearLabel, COUNTRY_COLUMN};

const MEAN_COLUMN: &str = "pm25_mean";

/// One country's mean PM2.5 for some grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryValue {
    pub country: String,
    pub value: f64,
}

/// One year's mean PM2.5 over a wide view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// KPI summary over per-country means. All fields are defined even on an
/// empty slice: `None` extrema, `None` mean, zero countries.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryStats {
    pub max: Option<CountryValue>,
    pub min: Option<CountryValue>,
    pub mean_of_means: Option<f64>,
    pub countries: usize,
}

impl SummaryStats {
    pub fn is_empty(&self) -> bool {
        self.countries == 0
    }
}

/// Mean of all non-null readings for one year, per country, in
/// first-appearance order. Countries with no reading that year are excluded
/// rather than reported as zero.
pub fn country_means_for_year(
    wide: &DataFrame,
    years: &[YearLabel],
    year: i32,
) -> Result<Vec<CountryValue>> {
    let label = resolve_year(years, year)?;

    let grouped = wide
        .clone()
        .lazy()
        .group_by_stable([col(COUNTRY_COLUMN)])
        .agg([col(label.label.as_str()).mean().alias(MEAN_COLUMN)])
        .filter(col(MEAN_COLUMN).is_not_null())
        .collect()?;

    read_country_values(&grouped)
}

/// Per-country mean of per-year means (one scalar per country). Years with no
/// reading for a country do not drag its mean down; a country with no reading
/// in any year is excluded.
pub fn country_overall_means(wide: &DataFrame, years: &[YearLabel]) -> Result<Vec<CountryValue>> {
    let aggs: Vec<Expr> = years
        .iter()
        .map(|year| col(year.label.as_str()).mean().alias(year.label.as_str()))
        .collect();

    let grouped = wide
        .clone()
        .lazy()
        .group_by_stable([col(COUNTRY_COLUMN)])
        .agg(aggs)
        .collect()?;

    let countries = grouped.column(COUNTRY_COLUMN)?.str()?;
    let mut year_means = Vec::with_capacity(years.len());
    for year in years {
        year_means.push(grouped.column(year.label.as_str())?.f64()?);
    }

    let mut out = Vec::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        let Some(country) = countries.get(idx) else {
            continue;
        };

        let mut sum = 0.0;
        let mut defined = 0usize;
        for column in &year_means {
            if let Some(value) = column.get(idx) {
                sum += value;
                defined += 1;
            }
        }

        if defined > 0 {
            out.push(CountryValue {
                country: country.to_string(),
                value: sum / defined as f64,
            });
        }
    }

    Ok(out)
}

/// Mean of all non-null readings per year, ascending by year. Years with no
/// reading anywhere are dropped, never emitted as zero placeholders.
pub fn global_trend(wide: &DataFrame, years: &[YearLabel]) -> Result<Vec<YearValue>> {
    let mut out = Vec::with_capacity(years.len());
    for year in years {
        if let Some(value) = wide.column(year.label.as_str())?.f64()?.mean() {
            out.push(YearValue {
                year: year.year,
                value,
            });
        }
    }
    Ok(out)
}

/// The `n` largest means, descending by value. The sort is stable, so ties
/// keep their input order, which also makes the operation idempotent.
pub fn top_n(means: &[CountryValue], n: usize) -> Vec<CountryValue> {
    let mut ranked = means.to_vec();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(n);
    ranked
}

/// Extrema and global KPIs over per-country means. Ties keep the first-seen
/// country.
pub fn summary(means: &[CountryValue]) -> SummaryStats {
    let mut stats = SummaryStats::default();
    let mut sum = 0.0;

    for entry in means {
        match &stats.max {
            Some(current) if current.value >= entry.value => {}
            _ => stats.max = Some(entry.clone()),
        }
        match &stats.min {
            Some(current) if current.value <= entry.value => {}
            _ => stats.min = Some(entry.clone()),
        }
        sum += entry.value;
        stats.countries += 1;
    }

    if stats.countries > 0 {
        stats.mean_of_means = Some(sum / stats.countries as f64);
    }

    stats
}

fn read_country_values(grouped: &DataFrame) -> Result<Vec<CountryValue>> {
    let countries = grouped.column(COUNTRY_COLUMN)?.str()?;
    let means = grouped.column(MEAN_COLUMN)?.f64()?;

    let mut out = Vec::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        if let (Some(country), Some(value)) = (countries.get(idx), means.get(idx)) {
            out.push(CountryValue {
                country: country.to_string(),
                value,
            });
        }
    }
    Ok(out)
}
