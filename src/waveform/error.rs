use std::path::PathBuf;

/// Errors that can occur while aggregating a capture folder
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// The folder itself could not be listed
    #[error("Cannot read capture folder {path}: {source}")]
    FolderUnreadable {
        /// Folder that failed to list
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Decoded captures in one folder have different sample counts
    #[error("Capture {file} has {actual} samples, expected {expected} like the preceding files")]
    RaggedCaptures {
        /// File whose length disagrees
        file: PathBuf,
        /// Length established by the first decoded file
        expected: usize,
        /// Length of the offending file
        actual: usize,
    },
}
