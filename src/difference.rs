//! Background subtraction.
//!
//! [`DifferenceEngine`] runs two folder aggregations (measurement and
//! background) and subtracts them sample by sample. Traces of different
//! length are rejected rather than truncated.

use std::fmt;

use log::info;

use crate::trace::Trace;
use crate::waveform::{AggregateError, AggregateOutcome, CancelToken, FolderAggregator, FolderSum};

/// Errors that can occur while computing a difference trace
#[derive(Debug, thiserror::Error)]
pub enum DifferenceError {
    /// One of the folder aggregations failed
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Measurement and background aggregates differ in length
    #[error("Length mismatch: measurement has {measurement} samples, background has {background}")]
    LengthMismatch {
        /// Samples in the measurement aggregate
        measurement: usize,
        /// Samples in the background aggregate
        background: usize,
    },
}

/// Which of the two folders a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The measurement folder.
    Measurement,
    /// The background folder.
    Background,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Measurement => write!(f, "measurement"),
            Channel::Background => write!(f, "background"),
        }
    }
}

/// Output of a completed difference run.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceResult {
    /// `measurement[i] - background[i]`.
    pub difference: Trace,
    /// Measurement folder sum.
    pub measurement: FolderSum,
    /// Background folder sum.
    pub background: FolderSum,
}

/// Subtract `background` from `measurement` sample by sample.
pub fn subtract(measurement: &Trace, background: &Trace) -> Result<Trace, DifferenceError> {
    if measurement.len() != background.len() {
        return Err(DifferenceError::LengthMismatch {
            measurement: measurement.len(),
            background: background.len(),
        });
    }

    Ok(Trace::new(
        measurement
            .iter()
            .zip(background.iter())
            .map(|(m, b)| m - b)
            .collect(),
    ))
}

/// Measurement minus background over two capture folders.
#[derive(Debug, Clone)]
pub struct DifferenceEngine {
    measurement: FolderAggregator,
    background: FolderAggregator,
}

impl DifferenceEngine {
    /// Engine over two configured aggregators.
    pub fn new(measurement: FolderAggregator, background: FolderAggregator) -> Self {
        Self {
            measurement,
            background,
        }
    }

    /// Measurement aggregator.
    pub fn measurement(&self) -> &FolderAggregator {
        &self.measurement
    }

    /// Background aggregator.
    pub fn background(&self) -> &FolderAggregator {
        &self.background
    }

    /// Total capture files across both folders (for progress bars).
    pub fn count_files(&self) -> Result<usize, DifferenceError> {
        Ok(self.measurement.count_files()? + self.background.count_files()?)
    }

    /// Aggregate both folders and subtract.
    ///
    /// `progress` receives the folder and its cumulative file count. The
    /// measurement folder is scanned first.
    pub fn run<F>(
        &self,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<AggregateOutcome<DifferenceResult>, DifferenceError>
    where
        F: FnMut(Channel, usize),
    {
        let measurement = match self
            .measurement
            .sum(cancel, |n| progress(Channel::Measurement, n))?
        {
            AggregateOutcome::Completed(sum) => sum,
            AggregateOutcome::Aborted => return Ok(AggregateOutcome::Aborted),
        };

        let background = match self
            .background
            .sum(cancel, |n| progress(Channel::Background, n))?
        {
            AggregateOutcome::Completed(sum) => sum,
            AggregateOutcome::Aborted => return Ok(AggregateOutcome::Aborted),
        };

        let difference = subtract(&measurement.trace, &background.trace)?;
        info!(
            "Difference trace computed: {} samples ({} measurement, {} background captures)",
            difference.len(),
            measurement.files_summed,
            background.files_summed
        );

        Ok(AggregateOutcome::Completed(DifferenceResult {
            difference,
            measurement,
            background,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtract() {
        let m = Trace::new(vec![10.0, 5.0, 3.0]);
        let b = Trace::new(vec![1.0, 5.0, 4.0]);
        assert_eq!(subtract(&m, &b).unwrap().samples(), &[9.0, 0.0, -1.0]);
    }

    #[test]
    fn test_length_mismatch_never_truncates() {
        let m = Trace::new(vec![1.0; 100]);
        let b = Trace::new(vec![1.0; 99]);
        match subtract(&m, &b) {
            Err(DifferenceError::LengthMismatch {
                measurement,
                background,
            }) => {
                assert_eq!(measurement, 100);
                assert_eq!(background, 99);
            }
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_minus_empty() {
        let diff = subtract(&Trace::empty(), &Trace::empty()).unwrap();
        assert!(diff.is_empty());
    }
}
