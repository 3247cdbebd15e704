//! # Calibration
//!
//! - [`mass`]: sample index → mass/charge via the two-point square-root law.
//! - [`pressure`]: intensity → partial pressure or normalized intensity.

mod error;
pub mod mass;
pub mod pressure;

pub use error::CalibrationError;
pub use mass::{CalibrationPoints, CalibrationTransform, MassCalibrator};
pub use pressure::{linear_fit, partial_pressures, PressureCalibrator, PressureModel, YCalibrationMode};
