// crates/airq/src/main.rs

use std::path::PathBuf;

use airq_core::{
    aggregate, export, FilterSpec, NormalizeOptions, PollutionDataset, RangeFilter, Selection,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A CLI front end for the PM2.5 pollution dataset pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about = "PM2.5 pollution dataset tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPI summary (extrema, mean of means, country count) over a slice
    Summary(SummaryArgs),
    /// Most polluted countries for one year
    Top(TopArgs),
    /// Mean PM2.5 per year, globally or for one country
    Trend(TrendArgs),
    /// Valid city choices for a country selection
    Cities(CitiesArgs),
    /// Write a filtered subset back out as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Path to the delimited PM2.5 input file
    #[arg(short, long)]
    file: PathBuf,
    /// Keep cells equal to 0 as genuine readings instead of treating them
    /// as missing
    #[arg(long)]
    keep_zeros: bool,
}

impl InputArgs {
    fn load(&self) -> Result<PollutionDataset> {
        PollutionDataset::from_path(
            &self.file,
            NormalizeOptions {
                zero_as_missing: !self.keep_zeros,
            },
        )
        .with_context(|| format!("failed to load dataset from {}", self.file.display()))
    }
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Restrict to one country ("all" for no restriction)
    #[arg(long)]
    country: Option<String>,
    /// Restrict to one city ("all" for no restriction)
    #[arg(long)]
    city: Option<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct TopArgs {
    #[command(flatten)]
    input: InputArgs,
    /// The year to rank countries by
    #[arg(short, long)]
    year: i32,
    /// How many countries to report
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct TrendArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Restrict the trend to one country ("all" for the global trend)
    #[arg(long)]
    country: Option<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CitiesArgs {
    #[command(flatten)]
    input: InputArgs,
    /// The country whose cities to list ("all" for every city)
    #[arg(long)]
    country: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Destination path for the exported CSV
    #[arg(short, long)]
    out: PathBuf,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// Year whose readings the range bounds apply to
    #[arg(long)]
    range_year: Option<i32>,
    /// Inclusive lower PM2.5 bound
    #[arg(long)]
    min: Option<f64>,
    /// Inclusive upper PM2.5 bound
    #[arg(long)]
    max: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Summary(args) => run_summary(args),
        Command::Top(args) => run_top(args),
        Command::Trend(args) => run_trend(args),
        Command::Cities(args) => run_cities(args),
        Command::Export(args) => run_export(args),
    }
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    let dataset = args.input.load()?;
    let spec = FilterSpec {
        country: Selection::from(args.country),
        city: Selection::from(args.city),
        range: None,
    };
    let view = dataset.filter(&spec)?;
    let means = aggregate::country_overall_means(&view.wide, dataset.year_labels())?;
    let stats = aggregate::summary(&means);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if stats.is_empty() {
        println!("No data available for this selection.");
        return Ok(());
    }

    let mut table = new_table(vec!["KPI", "Country", "PM2.5 (µg/m³)"]);
    if let Some(max) = &stats.max {
        table.add_row(vec![
            "Most polluted".to_string(),
            max.country.clone(),
            format!("{:.1}", max.value),
        ]);
    }
    if let Some(min) = &stats.min {
        table.add_row(vec![
            "Least polluted".to_string(),
            min.country.clone(),
            format!("{:.1}", min.value),
        ]);
    }
    if let Some(mean) = stats.mean_of_means {
        table.add_row(vec![
            "Mean of country means".to_string(),
            "-".to_string(),
            format!("{mean:.1}"),
        ]);
    }
    table.add_row(vec![
        "Countries reporting".to_string(),
        "-".to_string(),
        stats.countries.to_string(),
    ]);
    println!("{table}");
    Ok(())
}

fn run_top(args: TopArgs) -> Result<()> {
    let dataset = args.input.load()?;
    let means = aggregate::country_means_for_year(dataset.wide(), dataset.year_labels(), args.year)?;
    let ranked = aggregate::top_n(&means, args.count);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No data available for {}.", args.year);
        return Ok(());
    }

    let mut table = new_table(vec!["Rank", "Country", "PM2.5 (µg/m³)"]);
    for (rank, entry) in ranked.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            entry.country.clone(),
            format!("{:.1}", entry.value),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn run_trend(args: TrendArgs) -> Result<()> {
    let dataset = args.input.load()?;
    let spec = FilterSpec {
        country: Selection::from(args.country),
        ..FilterSpec::default()
    };
    let view = dataset.filter(&spec)?;
    let trend = aggregate::global_trend(&view.wide, dataset.year_labels())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
        return Ok(());
    }

    if trend.is_empty() {
        println!("No data available for this selection.");
        return Ok(());
    }

    let mut table = new_table(vec!["Year", "Mean PM2.5 (µg/m³)"]);
    for entry in &trend {
        table.add_row(vec![entry.year.to_string(), format!("{:.1}", entry.value)]);
    }
    println!("{table}");
    Ok(())
}

fn run_cities(args: CitiesArgs) -> Result<()> {
    let dataset = args.input.load()?;
    let cities = dataset.city_options(&Selection::from(args.country))?;
    for city in cities {
        println!("{city}");
    }
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let range = match (args.range_year, args.min, args.max) {
        (Some(year), Some(min), Some(max)) => Some(RangeFilter { year, min, max }),
        (None, None, None) => None,
        _ => bail!("--range-year, --min and --max must be provided together"),
    };

    let dataset = args.input.load()?;
    let spec = FilterSpec {
        country: Selection::from(args.country),
        city: Selection::from(args.city),
        range,
    };
    let view = dataset.filter(&spec)?;
    export::write_csv(&view.wide, &args.out)
        .with_context(|| format!("failed to write export to {}", args.out.display()))?;

    info!(rows = view.wide.height(), path = %args.out.display(), "export written");
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
