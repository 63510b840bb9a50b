use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur within a `BarSource` implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The source has nothing for this ticker.
    #[error("no data for ticker {0}")]
    NotFound(String),

    /// Reading the underlying file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header.
    #[error("missing required column {column:?}")]
    MissingColumn { column: &'static str },

    /// A cell could not be interpreted.
    #[error("row {row}: bad {column} value {value:?}")]
    BadValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}
