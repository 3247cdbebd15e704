//! Mass-calibrated spectra.

use crate::trace::Trace;

/// Errors building a [`MassSpectrum`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrumError {
    /// The mass axis and the intensity trace differ in length
    #[error("Mass axis has {mass} samples but intensity trace has {intensity}")]
    AxisMismatch {
        /// Mass axis length
        mass: usize,
        /// Intensity trace length
        intensity: usize,
    },
}

/// Parallel mass/charge and intensity axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassSpectrum {
    mass: Vec<f64>,
    intensity: Trace,
}

impl MassSpectrum {
    /// Pair a mass axis with an intensity trace of the same length.
    pub fn new(mass: Vec<f64>, intensity: Trace) -> Result<Self, SpectrumError> {
        if mass.len() != intensity.len() {
            return Err(SpectrumError::AxisMismatch {
                mass: mass.len(),
                intensity: intensity.len(),
            });
        }
        Ok(Self { mass, intensity })
    }

    /// Callers guarantee equal lengths.
    pub(crate) fn from_parts(mass: Vec<f64>, intensity: Trace) -> Self {
        debug_assert_eq!(mass.len(), intensity.len());
        Self { mass, intensity }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Whether the spectrum is empty.
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Mass/charge axis.
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Intensity trace.
    pub fn intensity(&self) -> &Trace {
        &self.intensity
    }

    /// Smallest and largest mass on the axis.
    ///
    /// This is the default peak-detection window after calibration.
    pub fn mass_range(&self) -> Option<(f64, f64)> {
        let min = self.mass.iter().copied().reduce(f64::min)?;
        let max = self.mass.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }

    /// Samples whose mass lies in `[start, end]`, in original order.
    ///
    /// The mass law is quadratic in the index, so the selected samples are
    /// not necessarily contiguous in the source trace.
    pub fn window(&self, start: f64, end: f64) -> MassSpectrum {
        let (mass, intensity): (Vec<f64>, Vec<f64>) = self
            .mass
            .iter()
            .zip(self.intensity.iter())
            .filter(|(m, _)| **m >= start && **m <= end)
            .map(|(&m, &y)| (m, y))
            .unzip();
        MassSpectrum {
            mass,
            intensity: Trace::new(intensity),
        }
    }

    /// Iterate over `(mass, intensity)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mass.iter().copied().zip(self.intensity.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_inclusive() {
        let spectrum = MassSpectrum::new(vec![1.0, 2.0, 3.0, 4.0], Trace::new(vec![10.0, 20.0, 30.0, 40.0])).unwrap();
        let w = spectrum.window(2.0, 3.0);
        assert_eq!(w.mass(), &[2.0, 3.0]);
        assert_eq!(w.intensity().samples(), &[20.0, 30.0]);
    }

    #[test]
    fn test_window_on_folded_axis() {
        // Quadratic axis dips then rises: the window selects both branches.
        let spectrum = MassSpectrum::new(vec![4.0, 1.0, 0.0, 1.0, 4.0], Trace::new(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let w = spectrum.window(0.5, 2.0);
        assert_eq!(w.intensity().samples(), &[2.0, 4.0]);
    }

    #[test]
    fn test_mass_range() {
        let spectrum = MassSpectrum::new(vec![4.0, 1.0, 9.0], Trace::new(vec![0.0; 3])).unwrap();
        assert_eq!(spectrum.mass_range(), Some((1.0, 9.0)));
        assert_eq!(MassSpectrum::default().mass_range(), None);
    }

    #[test]
    fn test_unequal_axes_rejected() {
        let err = MassSpectrum::new(vec![1.0, 2.0], Trace::new(vec![0.0; 3])).unwrap_err();
        assert_eq!(err, SpectrumError::AxisMismatch { mass: 2, intensity: 3 });
    }
}
