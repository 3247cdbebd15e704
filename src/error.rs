//! Crate-level error type.

use crate::calibration::CalibrationError;
use crate::difference::DifferenceError;
use crate::export::ExportError;
use crate::peaks::PeakError;
use crate::waveform::AggregateError;
use crate::worker::WorkerError;

/// Stage of the pipeline, used to report which prerequisite is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mass axis.
    MassCalibration,
    /// Detected peaks.
    Peaks,
    /// Fitted y-calibration model.
    YCalibration,
    /// Spectrum export.
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MassCalibration => "mass calibration",
            Self::Peaks => "peak detection",
            Self::YCalibration => "y-calibration",
            Self::Export => "export",
        };
        f.write_str(name)
    }
}

/// Any error raised while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Folder aggregation failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Background subtraction failed
    #[error(transparent)]
    Difference(#[from] DifferenceError),

    /// Mass or pressure calibration failed
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Peak analysis failed
    #[error(transparent)]
    Peaks(#[from] PeakError),

    /// Writing results failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Background worker failed
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// A stage was requested before the one it depends on ran
    #[error("{requested} requires {missing} to run first")]
    MissingStage {
        /// Stage that was requested
        requested: Stage,
        /// Stage whose result is absent
        missing: Stage,
    },
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
