pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod schema;

pub use aggregate::{CountryValue, SummaryStats, YearValue};
pub use dataset::{NormalizeOptions, PollutionDataset};
pub use error::{PipelineError, Result};
pub use filter::{FilterSpec, FilteredView, RangeFilter, Selection};
pub use schema::YearLabel;
