// crates/airq-core/src/dataset.rs

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::schema::{inspect_schema, YearLabel, CITY_COLUMN, COUNTRY_COLUMN};

pub const LONG_YEAR_COLUMN: &str = "year";
pub const LONG_VALUE_COLUMN: &str = "pm25";

/// Normalization policy applied while loading.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// The source instrumentation reports 0 for un-instrumented city/years
    /// instead of omitting the cell. When set, every year cell exactly equal
    /// to 0 is rewritten to null so it cannot bias downstream means. This
    /// also erases a genuine reading of exactly zero; callers with trusted
    /// data can turn it off.
    pub zero_as_missing: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            zero_as_missing: true,
        }
    }
}

/// The loaded dataset: wide and long tables plus the recognized year labels,
/// computed eagerly at load time and frozen until an explicit reload.
#[derive(Debug)]
pub struct PollutionDataset {
    wide: DataFrame,
    long: DataFrame,
    years: Vec<YearLabel>,
    options: NormalizeOptions,
}

impl PollutionDataset {
    pub fn from_path(path: impl AsRef<Path>, options: NormalizeOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&content, options)
    }

    pub fn from_bytes(content: &[u8], options: NormalizeOptions) -> Result<Self> {
        let (wide, years) = load_wide(content, options)?;
        let long = build_long(&wide, &years)?;

        info!(
            rows = wide.height(),
            year_columns = years.len(),
            zero_as_missing = options.zero_as_missing,
            "loaded pollution dataset"
        );

        Ok(Self {
            wide,
            long,
            years,
            options,
        })
    }

    /// Re-reads the input and atomically replaces every derived view. The
    /// base tables are never recomputed outside of this call.
    pub fn reload_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let replacement = Self::from_path(path, self.options)?;
        *self = replacement;
        Ok(())
    }

    pub fn wide(&self) -> &DataFrame {
        &self.wide
    }

    pub fn long(&self) -> &DataFrame {
        &self.long
    }

    pub fn year_labels(&self) -> &[YearLabel] {
        &self.years
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }
}

fn load_wide(content: &[u8], options: NormalizeOptions) -> Result<(DataFrame, Vec<YearLabel>)> {
    let null_values = NullValues::AllColumns(vec!["".into(), "NA".into(), "NaN".into()]);
    let parse_options = CsvParseOptions::default().with_null_values(Some(null_values));

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_ignore_errors(true)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()?;

    let years = inspect_schema(&raw)?;

    // Non-strict casts: a year cell that fails numeric parsing becomes null
    // rather than failing the load.
    let mut casts: Vec<Expr> = vec![
        col(CITY_COLUMN).cast(DataType::String),
        col(COUNTRY_COLUMN).cast(DataType::String),
    ];
    for year in &years {
        casts.push(col(year.label.as_str()).cast(DataType::Float64));
    }

    let mut lf = raw.lazy().with_columns(casts);

    if options.zero_as_missing {
        let rewrites: Vec<Expr> = years
            .iter()
            .map(|year| {
                when(col(year.label.as_str()).eq(lit(0.0)))
                    .then(lit(NULL))
                    .otherwise(col(year.label.as_str()))
                    .alias(year.label.as_str())
            })
            .collect();
        lf = lf.with_columns(rewrites);
    }

    Ok((lf.collect()?, years))
}

/// Unpivots the wide table into one (city, country, year, pm25) row per
/// observation. Row count is always wide.height() * years.len().
fn build_long(wide: &DataFrame, years: &[YearLabel]) -> Result<DataFrame> {
    let mut parts: Vec<LazyFrame> = Vec::with_capacity(years.len());
    for year in years {
        parts.push(wide.clone().lazy().select([
            col(CITY_COLUMN),
            col(COUNTRY_COLUMN),
            lit(year.year).alias(LONG_YEAR_COLUMN),
            col(year.label.as_str()).alias(LONG_VALUE_COLUMN),
        ]));
    }

    let long = concat(&parts, UnionArgs::default())?.collect()?;
    Ok(long)
}
