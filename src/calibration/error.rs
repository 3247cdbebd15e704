/// Errors that can occur while building or applying a calibration
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// Calibration points are degenerate (T₁ = T₂, or a mass ≤ 0, or non-finite)
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    /// Pressure calibration was requested without any peaks
    #[error("No peaks available for pressure calibration")]
    NoPeaks,

    /// Total pressure must be a positive, finite value
    #[error("Invalid total pressure: {0}")]
    InvalidPressure(f64),

    /// All peak areas sum to zero, so partial pressures are undefined
    #[error("Peak areas sum to zero; cannot apportion total pressure")]
    ZeroTotalArea,

    /// The largest peak height is zero or negative, so normalization is undefined
    #[error("Largest peak height is {0}; cannot normalize to 100")]
    NonPositiveMaximum(f64),
}
