//! # tofcal - Time-of-Flight Waveform Calibration
//!
//! `tofcal` turns folders of raw digitizer captures from a time-of-flight
//! mass spectrometer into a calibrated spectrum:
//!
//! ```text
//! measurement/*.data32 ─┐
//!                       ├─ sum, subtract ─▶ mass calibration ─▶ peaks ─▶ y-calibration ─▶ export
//! background/*.data32 ──┘
//! ```
//!
//! ## Key Features
//!
//! - **Streaming decode**: captures are read in fixed-size chunks with
//!   cooperative cancellation between chunks and between files.
//!
//! - **Resilient aggregation**: an unreadable capture is logged and skipped;
//!   captures of differing length are rejected rather than truncated.
//!
//! - **Two-point mass calibration**: the square-root time-of-flight law
//!   `m/q = ((i - t0) / C)^2` fitted from two reference peaks.
//!
//! - **Peak integration**: local maxima above a threshold, integrated out to
//!   their zero-crossings.
//!
//! - **Y-calibration**: absolute partial pressure from a least-squares fit of
//!   peak height to area share of a known total pressure, or normalization
//!   of the tallest peak to 100.
//!
//! - **All-or-nothing exports**: results are written to a temporary file and
//!   renamed into place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tofcal::prelude::*;
//!
//! let engine = DifferenceEngine::new(
//!     FolderAggregator::new("run/measurement"),
//!     FolderAggregator::new("run/background"),
//! );
//!
//! let worker = AggregationWorker::spawn(engine)?;
//! let result = match worker.wait()? {
//!     AggregateOutcome::Completed(result) => result,
//!     AggregateOutcome::Aborted => return Ok(()),
//! };
//!
//! let mut ctx = PipelineContext::from_difference(result);
//! ctx.calibrate_mass(&CalibrationPoints::new(1200.0, 18.0, 2400.0, 44.0))?;
//! ctx.detect_peaks(PeakAnalyzer::new(50_000.0, 1.0, 50.0))?;
//! ctx.calibrate_intensity(YCalibrationMode::AbsolutePressure, 4.43e-7)?;
//! ctx.export("spectrum.txt", true)?;
//! # Ok::<(), tofcal::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`waveform`]: capture decoding, folder summation, file ordering, cancellation
//! - [`trace`]: immutable sample vectors handed between stages
//! - [`difference`]: measurement minus background
//! - [`calibration`]: mass law and y-calibration models
//! - [`spectrum`]: mass axis paired with intensities
//! - [`peaks`]: peak detection and integration
//! - [`export`]: text exports
//! - [`pipeline`]: session state threaded through the stages
//! - [`worker`]: background aggregation thread
//! - [`survey`]: per-capture maximum over time
//!
//! ## Export Format
//!
//! | Y-calibration | Header | Intensity format |
//! |---------------|--------|------------------|
//! | none | `m/q<TAB>intensity` | `%.6f` |
//! | absolute pressure | `m/q<TAB>pressure (mbar)` | `%.9e` |
//! | normalize to 100 | `m/q<TAB>norm intensity` | `%.6f` |
//!
//! Mass is always written as `%.6f`.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod calibration;
pub mod difference;
pub mod error;
pub mod export;
pub mod peaks;
pub mod pipeline;
pub mod spectrum;
pub mod survey;
pub mod trace;
pub mod waveform;
pub mod worker;

pub use error::{PipelineError, Stage};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::calibration::{
        CalibrationError, CalibrationPoints, CalibrationTransform, MassCalibrator,
        PressureCalibrator, PressureModel, YCalibrationMode,
    };
    pub use crate::difference::{Channel, DifferenceEngine, DifferenceError, DifferenceResult};
    pub use crate::error::{PipelineError, Stage};
    pub use crate::export::{ExportError, ExportStats, IntensityUnits, SpectrumExporter};
    pub use crate::peaks::{Peak, PeakAnalysis, PeakAnalyzer, PeakError, PeakSet};
    pub use crate::pipeline::{PipelineContext, RunSummary};
    pub use crate::spectrum::{MassSpectrum, SpectrumError};
    pub use crate::survey::{IntensitySurvey, SurveyReport};
    pub use crate::trace::Trace;
    pub use crate::waveform::{
        AggregateError, AggregateOutcome, CancelToken, FileOrdering, FolderAggregator, FolderSum,
        WaveformDecoder,
    };
    pub use crate::worker::{AggregationWorker, WorkerError, WorkerEvent};
}
