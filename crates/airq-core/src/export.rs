// crates/airq-core/src/export.rs

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Serializes a wide view back to delimited text with the input schema.
/// Null cells become empty fields, so a written subset can be reloaded.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        CsvWriter::new(&mut cursor)
            .include_header(true)
            .finish(&mut clone)?;
    }
    Ok(buffer)
}

pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_csv_bytes(df)?;
    std::fs::write(path, bytes).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })
}
