//! # Peak analysis
//!
//! Finds local maxima above a detection threshold inside a mass window and
//! integrates each one out to its zero-crossings:
//!
//! 1. Restrict the spectrum to samples with `start <= m/q <= end`.
//! 2. Detect local maxima with height `>= threshold`.
//! 3. For each peak, walk left and right while the intensity stays strictly
//!    positive; the first non-positive sample (or the trace edge) is the bound.
//! 4. Area = sum of intensities over `[left, right]`, bounds included.
//!
//! The walk assumes a baseline near zero. No baseline correction is applied.
//!
//! Peak sets are recomputed from scratch whenever the threshold, window or
//! trace change; [`PeakAnalyzer`] holds no state between calls.

mod detect;
mod error;


pub use detect::{find_peaks, integrate, local_maxima, zero_crossings};
pub use error::PeakError;

use serde::{Deserialize, Serialize};

use crate::spectrum::MassSpectrum;

/// One detected peak. Indices refer to the windowed spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Index of the maximum.
    pub index: usize,
    /// Mass/charge at the maximum.
    pub mass: f64,
    /// Intensity at the maximum.
    pub height: f64,
    /// Left zero-crossing index.
    pub left: usize,
    /// Right zero-crossing index.
    pub right: usize,
    /// Mass/charge at the left bound.
    pub left_mass: f64,
    /// Mass/charge at the right bound.
    pub right_mass: f64,
    /// Sum of intensities over `[left, right]`.
    pub area: f64,
}

/// Peaks found in one analysis, in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    peaks: Vec<Peak>,
}

impl PeakSet {
    /// Wrap a list of peaks.
    pub fn new(peaks: Vec<Peak>) -> Self {
        Self { peaks }
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Whether no peaks were found.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Borrow the peaks.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Iterate over the peaks.
    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    /// Peak heights in order.
    pub fn heights(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.height).collect()
    }

    /// Peak areas in order.
    pub fn areas(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.area).collect()
    }

    /// Tallest peak height.
    pub fn max_height(&self) -> Option<f64> {
        self.peaks.iter().map(|p| p.height).reduce(f64::max)
    }

    /// Sum of all peak areas.
    pub fn total_area(&self) -> f64 {
        self.peaks.iter().map(|p| p.area).sum()
    }
}

impl<'a> IntoIterator for &'a PeakSet {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

/// Detect and integrate peaks over `(mass, intensity)` without windowing.
///
/// Returns an empty set when nothing reaches `threshold`.
pub fn analyze_peaks(spectrum: &MassSpectrum, threshold: f64) -> PeakSet {
    let x = spectrum.mass();
    let y = spectrum.intensity().samples();

    let peaks = find_peaks(y, threshold)
        .into_iter()
        .map(|p| {
            let (left, right) = zero_crossings(y, p);
            Peak {
                index: p,
                mass: x[p],
                height: y[p],
                left,
                right,
                left_mass: x[left],
                right_mass: x[right],
                area: integrate(y, left, right),
            }
        })
        .collect();

    PeakSet::new(peaks)
}

/// Windowed spectrum plus the peaks detected in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakAnalysis {
    /// Samples inside the mass window.
    pub window: MassSpectrum,
    /// Detected peaks (indices refer to `window`).
    pub peaks: PeakSet,
}

/// Detection parameters: threshold and mass window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakAnalyzer {
    /// Minimum peak height.
    pub threshold: f64,
    /// Inclusive window start (m/q).
    pub window_start: f64,
    /// Inclusive window end (m/q).
    pub window_end: f64,
}

impl PeakAnalyzer {
    /// Analyzer with an explicit window.
    pub fn new(threshold: f64, window_start: f64, window_end: f64) -> Self {
        Self {
            threshold,
            window_start,
            window_end,
        }
    }

    /// Analyzer whose window spans the full mass range of `spectrum`.
    pub fn full_range(threshold: f64, spectrum: &MassSpectrum) -> Self {
        let (start, end) = spectrum.mass_range().unwrap_or((0.0, 0.0));
        Self::new(threshold, start, end)
    }

    /// Window `spectrum` and detect peaks.
    pub fn analyze(&self, spectrum: &MassSpectrum) -> Result<PeakAnalysis, PeakError> {
        let window = spectrum.window(self.window_start, self.window_end);
        if window.is_empty() {
            return Err(PeakError::EmptyWindow {
                start: self.window_start,
                end: self.window_end,
            });
        }

        let peaks = analyze_peaks(&window, self.threshold);
        if peaks.is_empty() {
            return Err(PeakError::NoPeaksFound {
                threshold: self.threshold,
            });
        }

        log::info!(
            "Detected {} peaks in m/q window {}–{} (threshold {})",
            peaks.len(),
            self.window_start,
            self.window_end,
            self.threshold
        );
        Ok(PeakAnalysis { window, peaks })
    }
}
