//! Two-point time-of-flight mass calibration.
//!
//! Flight time grows with the square root of mass/charge, so two reference
//! peaks (T₁, m₁) and (T₂, m₂) pin down the law
//!
//! ```text
//! C  = (T₁ - T₂) / (√m₁ - √m₂)
//! t₀ = T₁ - C·√m₁
//! m(T) = ((T - t₀) / C)²
//! ```
//!
//! where T is the sample index.

use serde::{Deserialize, Serialize};

use crate::spectrum::MassSpectrum;
use crate::trace::Trace;

use super::error::CalibrationError;

/// Two (sample index, mass) reference pairs chosen by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoints {
    /// Sample index of the first reference peak.
    pub t1: f64,
    /// Known mass/charge of the first reference peak.
    pub m1: f64,
    /// Sample index of the second reference peak.
    pub t2: f64,
    /// Known mass/charge of the second reference peak.
    pub m2: f64,
}

impl CalibrationPoints {
    /// Bundle two reference pairs.
    pub fn new(t1: f64, m1: f64, t2: f64, m2: f64) -> Self {
        Self { t1, m1, t2, m2 }
    }

    /// Check the invariants T₁ ≠ T₂, m₁ > 0, m₂ > 0.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if ![self.t1, self.m1, self.t2, self.m2].iter().all(|v| v.is_finite()) {
            return Err(CalibrationError::InvalidCalibration(
                "calibration values must be finite".to_string(),
            ));
        }
        if self.t1 == self.t2 {
            return Err(CalibrationError::InvalidCalibration(format!(
                "T₁ and T₂ must differ (both {})",
                self.t1
            )));
        }
        if self.m1 <= 0.0 || self.m2 <= 0.0 {
            return Err(CalibrationError::InvalidCalibration(format!(
                "masses must be positive (m₁ = {}, m₂ = {})",
                self.m1, self.m2
            )));
        }
        if self.m1 == self.m2 {
            return Err(CalibrationError::InvalidCalibration(format!(
                "m₁ and m₂ must differ (both {})",
                self.m1
            )));
        }
        Ok(())
    }
}

/// Derived constants (C, t₀) of the square-root law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTransform {
    /// Samples per unit √(m/q).
    pub c: f64,
    /// Index offset at zero mass.
    pub t0: f64,
}

impl CalibrationTransform {
    /// Mass/charge at a (possibly fractional) sample index.
    pub fn mass(&self, index: f64) -> f64 {
        let x = (index - self.t0) / self.c;
        x * x
    }

    /// Mass axis for a trace of `len` samples.
    pub fn mass_axis(&self, len: usize) -> Vec<f64> {
        (0..len).map(|i| self.mass(i as f64)).collect()
    }
}

/// Builds [`CalibrationTransform`]s and applies them to traces.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassCalibrator;

impl MassCalibrator {
    /// Derive (C, t₀) from two reference points.
    pub fn fit(points: &CalibrationPoints) -> Result<CalibrationTransform, CalibrationError> {
        points.validate()?;

        let c = (points.t1 - points.t2) / (points.m1.sqrt() - points.m2.sqrt());
        let t0 = points.t1 - c * points.m1.sqrt();
        Ok(CalibrationTransform { c, t0 })
    }

    /// Pair `trace` with its calibrated mass axis.
    pub fn apply(transform: &CalibrationTransform, trace: &Trace) -> MassSpectrum {
        MassSpectrum::from_parts(transform.mass_axis(trace.len()), trace.clone())
    }

    /// Fit and apply in one step.
    pub fn calibrate(
        points: &CalibrationPoints,
        trace: &Trace,
    ) -> Result<(CalibrationTransform, MassSpectrum), CalibrationError> {
        let transform = Self::fit(points)?;
        Ok((transform, Self::apply(&transform, trace)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_points_map_back() {
        let points = CalibrationPoints::new(1200.0, 4.0, 5400.0, 40.0);
        let transform = MassCalibrator::fit(&points).unwrap();
        assert!((transform.mass(1200.0) - 4.0).abs() < 1e-9);
        assert!((transform.mass(5400.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_known_constants() {
        // C = (100 - 300) / (1 - 3) = 100, t0 = 100 - 100 = 0
        let transform = MassCalibrator::fit(&CalibrationPoints::new(100.0, 1.0, 300.0, 9.0)).unwrap();
        assert!((transform.c - 100.0).abs() < 1e-12);
        assert!(transform.t0.abs() < 1e-12);
        assert!((transform.mass(200.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_points() {
        let cases = [
            CalibrationPoints::new(10.0, 1.0, 10.0, 4.0),
            CalibrationPoints::new(10.0, 0.0, 20.0, 4.0),
            CalibrationPoints::new(10.0, 1.0, 20.0, -4.0),
            CalibrationPoints::new(10.0, 4.0, 20.0, 4.0),
            CalibrationPoints::new(f64::NAN, 1.0, 20.0, 4.0),
        ];
        for points in cases {
            assert!(matches!(
                MassCalibrator::fit(&points),
                Err(CalibrationError::InvalidCalibration(_))
            ));
        }
    }

    #[test]
    fn test_apply_builds_parallel_axis() {
        let trace = Trace::new(vec![0.0, 1.0, 2.0, 3.0]);
        let (transform, spectrum) =
            MassCalibrator::calibrate(&CalibrationPoints::new(1.0, 1.0, 3.0, 9.0), &trace).unwrap();
        assert_eq!(spectrum.len(), 4);
        assert_eq!(spectrum.mass()[2], transform.mass(2.0));
        assert_eq!(spectrum.intensity(), &trace);
    }
}
