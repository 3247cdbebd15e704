//! Folder summation.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::trace::Trace;

use super::cancel::CancelToken;
use super::decoder::{DecodeOutcome, WaveformDecoder};
use super::error::AggregateError;
use super::ordering::{list_files_with_extension, FileOrdering, CAPTURE_EXTENSION};

/// Result of a folder scan: either a finished sum or an abort.
///
/// Cancellation is not an error. An aborted scan carries no partial sum.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutcome<T> {
    /// The scan ran to completion.
    Completed(T),
    /// The cancellation flag was observed; all work was discarded.
    Aborted,
}

impl<T> AggregateOutcome<T> {
    /// The completed value, or `None` when aborted.
    pub fn completed(self) -> Option<T> {
        match self {
            AggregateOutcome::Completed(v) => Some(v),
            AggregateOutcome::Aborted => None,
        }
    }

    /// Whether the scan was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, AggregateOutcome::Aborted)
    }

    /// Map the completed value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> AggregateOutcome<U> {
        match self {
            AggregateOutcome::Completed(v) => AggregateOutcome::Completed(f(v)),
            AggregateOutcome::Aborted => AggregateOutcome::Aborted,
        }
    }
}

/// Summed trace of one folder plus bookkeeping about the files that fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderSum {
    /// Sample-wise sum of every decoded capture.
    pub trace: Trace,
    /// Number of files that contributed to the sum.
    pub files_summed: usize,
    /// Files that failed to decode and were left out.
    pub skipped: Vec<PathBuf>,
}

impl fmt::Display for FolderSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summed {} captures ({} samples), skipped {}",
            self.files_summed,
            self.trace.len(),
            self.skipped.len()
        )
    }
}

/// Sums every capture file in a folder into one aggregate trace.
#[derive(Debug, Clone)]
pub struct FolderAggregator {
    folder: PathBuf,
    extension: String,
    ordering: FileOrdering,
    decoder: WaveformDecoder,
}

impl FolderAggregator {
    /// Aggregator over `folder` using the `.data32` extension.
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self {
            folder: folder.into(),
            extension: CAPTURE_EXTENSION.to_string(),
            ordering: FileOrdering::default(),
            decoder: WaveformDecoder::default(),
        }
    }

    /// Override the capture extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the file ordering policy (affects progress order only).
    pub fn with_ordering(mut self, ordering: FileOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Folder being aggregated.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Capture files in the folder, in the configured order.
    pub fn capture_files(&self) -> Result<Vec<PathBuf>, AggregateError> {
        let names = list_files_with_extension(&self.folder, &self.extension, self.ordering)
            .map_err(|source| AggregateError::FolderUnreadable {
                path: self.folder.clone(),
                source,
            })?;
        Ok(names.into_iter().map(|n| self.folder.join(n)).collect())
    }

    /// Number of capture files in the folder.
    pub fn count_files(&self) -> Result<usize, AggregateError> {
        Ok(self.capture_files()?.len())
    }

    /// Decode and sum every capture file.
    ///
    /// `progress` is called after each file with the cumulative number of
    /// files processed, skipped ones included. An empty folder yields an
    /// empty trace. If `cancel` is set at any point the result is
    /// [`AggregateOutcome::Aborted`].
    pub fn sum<F>(
        &self,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<AggregateOutcome<FolderSum>, AggregateError>
    where
        F: FnMut(usize),
    {
        let files = self.capture_files()?;
        info!(
            "Aggregating {} capture files in {}",
            files.len(),
            self.folder.display()
        );

        let mut sum: Option<Vec<f64>> = None;
        let mut files_summed = 0usize;
        let mut skipped = Vec::new();

        for (i, path) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Aggregation of {} aborted", self.folder.display());
                return Ok(AggregateOutcome::Aborted);
            }

            let decoded = self.decoder.decode_file(path, cancel);
            match decoded.outcome {
                DecodeOutcome::Cancelled => {
                    info!("Aggregation of {} aborted", self.folder.display());
                    return Ok(AggregateOutcome::Aborted);
                }
                DecodeOutcome::Failed(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(path.clone());
                }
                DecodeOutcome::Complete => {
                    match sum.as_mut() {
                        None => {
                            sum = Some(decoded.samples.iter().map(|&v| v as f64).collect());
                        }
                        Some(acc) => {
                            if acc.len() != decoded.samples.len() {
                                return Err(AggregateError::RaggedCaptures {
                                    file: path.clone(),
                                    expected: acc.len(),
                                    actual: decoded.samples.len(),
                                });
                            }
                            for (a, &v) in acc.iter_mut().zip(decoded.samples.iter()) {
                                *a += v as f64;
                            }
                        }
                    }
                    files_summed += 1;
                }
            }

            debug!("Processed {}/{} captures", i + 1, files.len());
            progress(i + 1);
        }

        if cancel.is_cancelled() {
            return Ok(AggregateOutcome::Aborted);
        }

        Ok(AggregateOutcome::Completed(FolderSum {
            trace: Trace::new(sum.unwrap_or_default()),
            files_summed,
            skipped,
        }))
    }
}
