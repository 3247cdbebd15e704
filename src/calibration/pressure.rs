//! Vertical-axis calibration.
//!
//! Two modes are supported:
//!
//! - **Absolute pressure**: the known total pressure p₀ is split across the
//!   detected peaks in proportion to their areas, then a least-squares line
//!   maps peak height to partial pressure. The line is applied to every
//!   sample of the trace.
//! - **Normalize to 100**: every sample is scaled by `100 / max(peak height)`.

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::peaks::PeakSet;
use crate::trace::Trace;

use super::error::CalibrationError;

/// Y-axis calibration mode selected by the operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YCalibrationMode {
    /// Raw intensities.
    #[default]
    None,
    /// Peak-height → partial-pressure linear fit.
    #[serde(alias = "absolute")]
    AbsolutePressure,
    /// Scale so the tallest detected peak reads 100.
    #[serde(rename = "normalize-to-100", alias = "normalize")]
    NormalizeTo100,
}

impl YCalibrationMode {
    /// Returns all available mode names.
    pub fn variants() -> &'static [&'static str] {
        &["none", "absolute-pressure", "normalize-to-100"]
    }

    /// Whether this mode needs peak detection.
    pub fn requires_peaks(&self) -> bool {
        !matches!(self, YCalibrationMode::None)
    }
}

impl fmt::Display for YCalibrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YCalibrationMode::None => write!(f, "none"),
            YCalibrationMode::AbsolutePressure => write!(f, "absolute-pressure"),
            YCalibrationMode::NormalizeTo100 => write!(f, "normalize-to-100"),
        }
    }
}

impl FromStr for YCalibrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(YCalibrationMode::None),
            "absolute-pressure" | "absolute" | "pressure" => Ok(YCalibrationMode::AbsolutePressure),
            "normalize-to-100" | "normalize" | "normalise" => Ok(YCalibrationMode::NormalizeTo100),
            _ => Err(format!(
                "Unknown y-calibration mode '{}'. Valid options: {}",
                s,
                YCalibrationMode::variants().join(", ")
            )),
        }
    }
}

/// A fitted intensity model, applied as a pure function over a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PressureModel {
    /// `pressure = slope · intensity + intercept`
    Linear {
        /// Pressure per unit intensity.
        slope: f64,
        /// Pressure at zero intensity.
        intercept: f64,
    },
    /// `normalized = factor · intensity`
    Normalize {
        /// `100 / max(peak height)`.
        factor: f64,
    },
}

impl PressureModel {
    /// Evaluate the model at one intensity.
    pub fn eval(&self, intensity: f64) -> f64 {
        match *self {
            PressureModel::Linear { slope, intercept } => slope * intensity + intercept,
            PressureModel::Normalize { factor } => intensity * factor,
        }
    }

    /// Apply to every sample of `trace`.
    pub fn apply(&self, trace: &Trace) -> Trace {
        trace.map(|v| self.eval(v))
    }

    /// Mode this model belongs to.
    pub fn mode(&self) -> YCalibrationMode {
        match self {
            PressureModel::Linear { .. } => YCalibrationMode::AbsolutePressure,
            PressureModel::Normalize { .. } => YCalibrationMode::NormalizeTo100,
        }
    }
}

impl fmt::Display for PressureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureModel::Linear { slope, intercept } => {
                write!(f, "y = {:.3e}·x + {:.3e}", slope, intercept)
            }
            PressureModel::Normalize { factor } => write!(f, "y = {:.6e}·x", factor),
        }
    }
}

/// Ordinary least-squares line through `(x, y)` pairs.
///
/// Returns `(slope, intercept)`, or `None` when fewer than two points are
/// given or every `x` is equal.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x[..n].iter().zip(&y[..n]) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }

    if sxx == 0.0 || !sxx.is_finite() {
        return None;
    }

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Minimum-norm least-squares line for points that share one `x`.
///
/// The design matrix `[x, 1]` has rank one here, so the line is not unique.
/// Each column is scaled to unit norm (a zero column keeps scale 1) and the
/// shortest solution is taken. For `x = h != 0` this gives
/// `slope = mean(y) / (2h)` and `intercept = mean(y) / 2`; for `h = 0` the
/// slope is 0 and the intercept is `mean(y)`.
fn minimum_norm_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0);
    }
    let n_f = n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;
    let h = x[..n].iter().sum::<f64>() / n_f;

    if h == 0.0 {
        (0.0, mean_y)
    } else {
        (mean_y / (2.0 * h), mean_y / 2.0)
    }
}

/// Split `total_pressure` over peaks in proportion to their areas.
pub fn partial_pressures(areas: &[f64], total_pressure: f64) -> Result<Vec<f64>, CalibrationError> {
    let total: f64 = areas.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(CalibrationError::ZeroTotalArea);
    }
    Ok(areas.iter().map(|a| total_pressure * a / total).collect())
}

/// Fits [`PressureModel`]s from a detected [`PeakSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PressureCalibrator;

impl PressureCalibrator {
    /// Fit the absolute-pressure model.
    pub fn fit_absolute(peaks: &PeakSet, total_pressure: f64) -> Result<PressureModel, CalibrationError> {
        if peaks.is_empty() {
            return Err(CalibrationError::NoPeaks);
        }
        if !(total_pressure.is_finite() && total_pressure > 0.0) {
            return Err(CalibrationError::InvalidPressure(total_pressure));
        }

        let heights = peaks.heights();
        let partial = partial_pressures(&peaks.areas(), total_pressure)?;

        let (slope, intercept) = match linear_fit(&heights, &partial) {
            Some(fit) => fit,
            None => {
                warn!(
                    "Pressure fit is rank deficient ({} peak(s), equal heights); using the minimum-norm line",
                    heights.len()
                );
                minimum_norm_fit(&heights, &partial)
            }
        };

        debug!("Pressure fit: slope {:e}, intercept {:e}", slope, intercept);
        Ok(PressureModel::Linear { slope, intercept })
    }

    /// Fit the normalize-to-100 model.
    pub fn fit_normalize(peaks: &PeakSet) -> Result<PressureModel, CalibrationError> {
        let max = peaks.max_height().ok_or(CalibrationError::NoPeaks)?;
        if max <= 0.0 {
            return Err(CalibrationError::NonPositiveMaximum(max));
        }
        Ok(PressureModel::Normalize { factor: 100.0 / max })
    }

    /// Fit the model for `mode`. Returns `None` for [`YCalibrationMode::None`].
    pub fn fit(
        mode: YCalibrationMode,
        peaks: &PeakSet,
        total_pressure: f64,
    ) -> Result<Option<PressureModel>, CalibrationError> {
        match mode {
            YCalibrationMode::None => Ok(None),
            YCalibrationMode::AbsolutePressure => Self::fit_absolute(peaks, total_pressure).map(Some),
            YCalibrationMode::NormalizeTo100 => Self::fit_normalize(peaks).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::Peak;

    fn peak(height: f64, area: f64) -> Peak {
        Peak {
            index: 0,
            mass: 0.0,
            height,
            left: 0,
            right: 0,
            left_mass: 0.0,
            right_mass: 0.0,
            area,
        }
    }

    #[test]
    fn test_linear_fit_exact() {
        let (slope, intercept) = linear_fit(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(linear_fit(&[1.0], &[2.0]).is_none());
        assert!(linear_fit(&[2.0, 2.0], &[1.0, 3.0]).is_none());
    }

    #[test]
    fn test_absolute_fit_through_both_points() {
        // Heights 10 and 20 with areas proportional to height: p0 = 0.3 splits 0.1 / 0.2.
        let peaks = PeakSet::new(vec![peak(10.0, 50.0), peak(20.0, 100.0)]);
        let model = PressureCalibrator::fit_absolute(&peaks, 0.3).unwrap();
        assert!((model.eval(10.0) - 0.1).abs() < 1e-12);
        assert!((model.eval(20.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_peak_fallback() {
        let peaks = PeakSet::new(vec![peak(8.0, 40.0)]);
        let model = PressureCalibrator::fit_absolute(&peaks, 4.0).unwrap();
        let PressureModel::Linear { slope, intercept } = model else {
            panic!("expected a linear model, got {:?}", model);
        };
        assert!((slope - 0.25).abs() < 1e-12);
        assert!((intercept - 2.0).abs() < 1e-12);
        assert!((model.eval(8.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_heights_use_minimum_norm_line() {
        // Two peaks of height 5 share p0 = 1.0 as 0.25 / 0.75; mean partial 0.5.
        let peaks = PeakSet::new(vec![peak(5.0, 10.0), peak(5.0, 30.0)]);
        let model = PressureCalibrator::fit_absolute(&peaks, 1.0).unwrap();
        assert_eq!(
            model,
            PressureModel::Linear {
                slope: 0.05,
                intercept: 0.25
            }
        );
    }

    #[test]
    fn test_minimum_norm_fit_zero_height() {
        assert_eq!(minimum_norm_fit(&[0.0, 0.0], &[1.0, 3.0]), (0.0, 2.0));
    }

    #[test]
    fn test_normalize_factor() {
        let peaks = PeakSet::new(vec![peak(10.0, 1.0), peak(40.0, 1.0)]);
        let model = PressureCalibrator::fit_normalize(&peaks).unwrap();
        assert_eq!(model, PressureModel::Normalize { factor: 2.5 });

        let scaled = model.apply(&Trace::new(vec![0.0, 40.0, -4.0]));
        assert_eq!(scaled.samples(), &[0.0, 100.0, -10.0]);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let empty = PeakSet::default();
        assert!(matches!(
            PressureCalibrator::fit_absolute(&empty, 1.0),
            Err(CalibrationError::NoPeaks)
        ));
        let peaks = PeakSet::new(vec![peak(1.0, 1.0)]);
        assert!(matches!(
            PressureCalibrator::fit_absolute(&peaks, -1.0),
            Err(CalibrationError::InvalidPressure(_))
        ));
        let flat = PeakSet::new(vec![peak(1.0, 0.0), peak(2.0, 0.0)]);
        assert!(matches!(
            PressureCalibrator::fit_absolute(&flat, 1.0),
            Err(CalibrationError::ZeroTotalArea)
        ));
    }

    #[test]
    fn test_none_mode_fits_nothing() {
        let fit = PressureCalibrator::fit(YCalibrationMode::None, &PeakSet::default(), 1.0).unwrap();
        assert!(fit.is_none());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            YCalibrationMode::from_str("Absolute-Pressure").unwrap(),
            YCalibrationMode::AbsolutePressure
        );
        assert!(YCalibrationMode::from_str("log").is_err());
    }
}
