//! Immutable sample traces.
//!
//! A [`Trace`] is the unit of hand-off between pipeline stages: aggregation
//! produces one, subtraction consumes two and produces a third, and the mass
//! calibrator pairs one with a mass axis. Stages never patch a trace in place;
//! a changed input always yields a new trace.

use std::ops::Index;

/// An ordered, immutable sequence of samples indexed `0..len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    samples: Vec<f64>,
}

impl Trace {
    /// Wrap an owned sample vector.
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// An empty trace (zero samples).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the trace holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Iterate over the samples.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.samples.iter()
    }

    /// Largest sample, or `None` for an empty trace.
    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    /// Smallest sample, or `None` for an empty trace.
    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    /// Apply `f` to every sample, producing a new trace.
    pub fn map<F>(&self, f: F) -> Trace
    where
        F: Fn(f64) -> f64,
    {
        Trace::new(self.samples.iter().map(|&v| f(v)).collect())
    }
}

impl From<Vec<f64>> for Trace {
    fn from(samples: Vec<f64>) -> Self {
        Self::new(samples)
    }
}

impl From<&[u32]> for Trace {
    fn from(samples: &[u32]) -> Self {
        Self::new(samples.iter().map(|&v| v as f64).collect())
    }
}

impl Index<usize> for Trace {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
