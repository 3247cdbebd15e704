//! # Intensity-over-time survey
//!
//! Tracks how a signal evolves across a folder of captures: for each file
//! (in shot order, keeping every `skip`-th one) the largest sample inside an
//! index range is recorded. Files that fail to decode, or whose range is
//! empty after clamping, are reported as missing instead of failing the run.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::export::{write_records, ExportError};
use crate::waveform::{
    list_files_with_extension, shot_number, AggregateError, AggregateOutcome, CancelToken,
    DecodeOutcome, FileOrdering, WaveformDecoder, CAPTURE_EXTENSION,
};

/// Maximum sample of one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyPoint {
    /// Capture file name.
    pub file_name: String,
    /// Shot number parsed from the name (0 when absent).
    pub shot: u64,
    /// Maximum in range, `None` when the file was missing.
    pub max_value: Option<u32>,
}

/// One exported survey row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRow {
    /// Capture file name.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Maximum sample in range.
    #[serde(rename = "MaxValue")]
    pub max_value: u32,
}

/// All survey points, in shot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyReport {
    points: Vec<SurveyPoint>,
}

impl SurveyReport {
    /// Every visited file, including missing ones.
    pub fn points(&self) -> &[SurveyPoint] {
        &self.points
    }

    /// Rows for files that produced a value.
    pub fn rows(&self) -> Vec<SurveyRow> {
        self.points
            .iter()
            .filter_map(|p| {
                p.max_value.map(|max_value| SurveyRow {
                    file_name: p.file_name.clone(),
                    max_value,
                })
            })
            .collect()
    }

    /// First and last shot number visited.
    pub fn shot_span(&self) -> Option<(u64, u64)> {
        let first = self.points.first()?.shot;
        let last = self.points.last()?.shot;
        Some((first, last))
    }

    /// Names of files that produced no value.
    pub fn missing(&self) -> Vec<&str> {
        self.points
            .iter()
            .filter(|p| p.max_value.is_none())
            .map(|p| p.file_name.as_str())
            .collect()
    }

    /// Write `FileName,MaxValue` rows, missing files omitted.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<usize, ExportError> {
        write_records(path, &self.rows())
    }
}

impl fmt::Display for SurveyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = self.missing().len();
        write!(f, "Surveyed {} captures", self.points.len())?;
        if let Some((first, last)) = self.shot_span() {
            write!(f, ", shots {}..={}", first, last)?;
        }
        write!(f, " ({} missing)", missing)
    }
}

/// Configured survey over one folder.
#[derive(Debug, Clone)]
pub struct IntensitySurvey {
    folder: PathBuf,
    extension: String,
    skip: usize,
    x_min: usize,
    x_max: Option<usize>,
    decoder: WaveformDecoder,
}

impl IntensitySurvey {
    /// Survey every capture in `folder` over the full sample range.
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self {
            folder: folder.into(),
            extension: CAPTURE_EXTENSION.to_string(),
            skip: 1,
            x_min: 0,
            x_max: None,
            decoder: WaveformDecoder::default(),
        }
    }

    /// Match a different capture extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Keep every `skip`-th file. Zero is treated as one.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip.max(1);
        self
    }

    /// Restrict to sample indices `[x_min, x_max)`. `None` means end of file.
    pub fn with_range(mut self, x_min: usize, x_max: Option<usize>) -> Self {
        self.x_min = x_min;
        self.x_max = x_max;
        self
    }

    /// Files that will be visited, in shot order.
    pub fn selected_files(&self) -> Result<Vec<String>, AggregateError> {
        let names =
            list_files_with_extension(&self.folder, &self.extension, FileOrdering::NumericSuffix)
                .map_err(|source| AggregateError::FolderUnreadable {
                    path: self.folder.clone(),
                    source,
                })?;
        Ok(names.into_iter().step_by(self.skip).collect())
    }

    /// Maximum of `samples[x_min..x_max]` after clamping to the sample count.
    pub fn range_max(&self, samples: &[u32]) -> Option<u32> {
        let end = self.x_max.unwrap_or(samples.len()).min(samples.len());
        let start = self.x_min.min(end);
        samples[start..end].iter().copied().max()
    }

    /// Visit the selected files. `progress` receives the cumulative count.
    pub fn run<F>(
        &self,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<AggregateOutcome<SurveyReport>, AggregateError>
    where
        F: FnMut(usize),
    {
        let names = self.selected_files()?;
        info!(
            "Surveying {} captures in {}",
            names.len(),
            self.folder.display()
        );

        let mut points = Vec::with_capacity(names.len());
        for (i, name) in names.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(AggregateOutcome::Aborted);
            }

            let decoded = self.decoder.decode_file(self.folder.join(&name), cancel);
            let max_value = match decoded.outcome {
                DecodeOutcome::Cancelled => return Ok(AggregateOutcome::Aborted),
                DecodeOutcome::Failed(e) => {
                    warn!("No survey value for {}: {}", name, e);
                    None
                }
                DecodeOutcome::Complete => self.range_max(&decoded.samples),
            };
            debug!("{} -> {:?}", name, max_value);

            points.push(SurveyPoint {
                shot: shot_number(&name),
                file_name: name,
                max_value,
            });
            progress(i + 1);
        }

        Ok(AggregateOutcome::Completed(SurveyReport { points }))
    }
}
