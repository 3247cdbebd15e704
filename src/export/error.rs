use std::path::PathBuf;

/// Errors that can occur while exporting results
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error while writing the temporary file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the delimited-text writer or reader
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The finished temporary file could not be moved into place
    #[error("Failed to commit export to {path}: {source}")]
    PersistFailed {
        /// Destination that was not written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Mass and intensity columns differ in length
    #[error("Column length mismatch: {mass} mass values, {intensity} intensity values")]
    ColumnMismatch {
        /// Length of the mass column
        mass: usize,
        /// Length of the intensity column
        intensity: usize,
    },

    /// A field in a re-read export could not be parsed
    #[error("Invalid value '{value}' on line {line}")]
    InvalidValue {
        /// Offending text
        value: String,
        /// 1-based line number
        line: u64,
    },
}
