//! # Pipeline session
//!
//! [`PipelineContext`] carries the results of one processing session from
//! stage to stage:
//!
//! ```text
//! difference -> calibrate_mass -> detect_peaks -> calibrate_intensity -> export
//! ```
//!
//! Each stage reads what earlier stages produced and replaces its own slot
//! only when it succeeds, so a failed stage (for example
//! [`PeakError::NoPeaksFound`](crate::peaks::PeakError::NoPeaksFound)) can be
//! retried with new parameters. Re-running a stage clears everything
//! downstream of it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::calibration::{
    CalibrationPoints, CalibrationTransform, MassCalibrator, PressureCalibrator, PressureModel,
    YCalibrationMode,
};
use crate::difference::DifferenceResult;
use crate::error::{PipelineError, Result, Stage};
use crate::export::{write_atomically, ExportStats, IntensityUnits, SpectrumExporter};
use crate::peaks::{PeakAnalysis, PeakAnalyzer, PeakSet};
use crate::spectrum::MassSpectrum;
use crate::trace::Trace;

/// File counts of the two aggregation passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    /// Measurement captures summed.
    pub measurement: usize,
    /// Background captures summed.
    pub background: usize,
    /// Captures that failed to decode, from either folder.
    pub skipped: Vec<PathBuf>,
}

/// State of one processing session.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    difference: Trace,
    files: FileCounts,
    points: Option<CalibrationPoints>,
    transform: Option<CalibrationTransform>,
    spectrum: Option<MassSpectrum>,
    analyzer: Option<PeakAnalyzer>,
    analysis: Option<PeakAnalysis>,
    y_mode: YCalibrationMode,
    pressure: Option<PressureModel>,
}

impl PipelineContext {
    /// Start a session from a completed difference run.
    pub fn from_difference(result: DifferenceResult) -> Self {
        let mut skipped = result.measurement.skipped;
        skipped.extend(result.background.skipped);
        let files = FileCounts {
            measurement: result.measurement.files_summed,
            background: result.background.files_summed,
            skipped,
        };
        Self::with_files(result.difference, files)
    }

    /// Start a session from an already computed trace.
    pub fn from_trace(difference: Trace) -> Self {
        Self::with_files(difference, FileCounts::default())
    }

    fn with_files(difference: Trace, files: FileCounts) -> Self {
        Self {
            difference,
            files,
            points: None,
            transform: None,
            spectrum: None,
            analyzer: None,
            analysis: None,
            y_mode: YCalibrationMode::None,
            pressure: None,
        }
    }

    /// Background-subtracted trace.
    pub fn difference(&self) -> &Trace {
        &self.difference
    }

    /// File bookkeeping from the aggregation passes.
    pub fn files(&self) -> &FileCounts {
        &self.files
    }

    /// Current mass calibration, if any.
    pub fn transform(&self) -> Option<&CalibrationTransform> {
        self.transform.as_ref()
    }

    /// Mass-calibrated spectrum, if any.
    pub fn spectrum(&self) -> Option<&MassSpectrum> {
        self.spectrum.as_ref()
    }

    /// Latest peak analysis, if any.
    pub fn analysis(&self) -> Option<&PeakAnalysis> {
        self.analysis.as_ref()
    }

    /// Latest y-calibration model. `None` also when the mode is `None`.
    pub fn pressure_model(&self) -> Option<&PressureModel> {
        self.pressure.as_ref()
    }

    /// Fit the mass law and build the spectrum. Clears peaks and
    /// y-calibration.
    pub fn calibrate_mass(&mut self, points: &CalibrationPoints) -> Result<&MassSpectrum> {
        let (transform, spectrum) = MassCalibrator::calibrate(points, &self.difference)?;
        info!(
            "Mass calibration: C = {:.6}, t0 = {:.3}",
            transform.c, transform.t0
        );

        self.points = Some(*points);
        self.transform = Some(transform);
        self.analyzer = None;
        self.analysis = None;
        self.y_mode = YCalibrationMode::None;
        self.pressure = None;
        Ok(&*self.spectrum.insert(spectrum))
    }

    /// Detect peaks on the calibrated spectrum. Clears y-calibration.
    pub fn detect_peaks(&mut self, analyzer: PeakAnalyzer) -> Result<&PeakSet> {
        let spectrum = self.spectrum.as_ref().ok_or(PipelineError::MissingStage {
            requested: Stage::Peaks,
            missing: Stage::MassCalibration,
        })?;
        let analysis = analyzer.analyze(spectrum)?;

        self.analyzer = Some(analyzer);
        self.y_mode = YCalibrationMode::None;
        self.pressure = None;
        Ok(&self.analysis.insert(analysis).peaks)
    }

    /// Fit the y-calibration for `mode` from the current peaks.
    ///
    /// [`YCalibrationMode::None`] needs no peaks and clears any model.
    pub fn calibrate_intensity(
        &mut self,
        mode: YCalibrationMode,
        total_pressure: f64,
    ) -> Result<Option<&PressureModel>> {
        if !mode.requires_peaks() {
            self.y_mode = mode;
            self.pressure = None;
            return Ok(None);
        }

        let analysis = self.analysis.as_ref().ok_or(PipelineError::MissingStage {
            requested: Stage::YCalibration,
            missing: Stage::Peaks,
        })?;
        let model = PressureCalibrator::fit(mode, &analysis.peaks, total_pressure)?;
        if let Some(m) = &model {
            info!("Y-calibration ({}): {}", mode, m);
        }

        self.y_mode = mode;
        self.pressure = model;
        Ok(self.pressure.as_ref())
    }

    /// Intensity column and its units, y-calibrated when `use_y_calibration`
    /// is set and a model exists.
    pub fn output_intensity(&self, use_y_calibration: bool) -> (Trace, IntensityUnits) {
        match (&self.pressure, use_y_calibration) {
            (Some(model), true) => (model.apply(&self.difference), IntensityUnits::for_model(Some(model))),
            _ => (self.difference.clone(), IntensityUnits::Counts),
        }
    }

    /// Write the calibrated spectrum to `path`.
    pub fn export<P: AsRef<Path>>(&self, path: P, use_y_calibration: bool) -> Result<ExportStats> {
        let spectrum = self.spectrum.as_ref().ok_or(PipelineError::MissingStage {
            requested: Stage::Export,
            missing: Stage::MassCalibration,
        })?;
        let (intensity, units) = self.output_intensity(use_y_calibration);
        let stats = SpectrumExporter::new(units).export(path, spectrum.mass(), intensity.samples())?;
        Ok(stats)
    }

    /// Snapshot of the session for the run summary.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            created_at: Utc::now(),
            samples: self.difference.len(),
            files: self.files.clone(),
            calibration_points: self.points,
            transform: self.transform,
            peak_parameters: self.analyzer,
            peaks: self.analysis.as_ref().map(|a| a.peaks.clone()),
            y_calibration: self.y_mode,
            pressure_model: self.pressure,
        }
    }
}

/// Serializable record of a processing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the summary was produced.
    pub created_at: DateTime<Utc>,
    /// Length of the difference trace.
    pub samples: usize,
    /// Aggregation bookkeeping.
    pub files: FileCounts,
    /// Reference points used for mass calibration.
    pub calibration_points: Option<CalibrationPoints>,
    /// Fitted mass-law constants.
    pub transform: Option<CalibrationTransform>,
    /// Threshold and window of the peak analysis.
    pub peak_parameters: Option<PeakAnalyzer>,
    /// Detected peaks.
    pub peaks: Option<PeakSet>,
    /// Active y-calibration mode.
    pub y_calibration: YCalibrationMode,
    /// Fitted y-calibration model.
    pub pressure_model: Option<PressureModel>,
}

impl RunSummary {
    /// Write as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomically(path.as_ref(), |w| {
            serde_json::to_writer_pretty(&mut *w, self)?;
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::read_spectrum;
    use std::fs;
    use tempfile::tempdir;

    // Identity-like calibration: mass(i) = i² with C = 1, t0 = 0.
    fn points() -> CalibrationPoints {
        CalibrationPoints::new(2.0, 4.0, 3.0, 9.0)
    }

    fn context() -> PipelineContext {
        PipelineContext::from_trace(Trace::new(vec![
            0.0, 0.0, 5.0, 10.0, 5.0, 0.0, 0.0, 0.0, 3.0, 8.0, 3.0, 0.0,
        ]))
    }

    #[test]
    fn test_stages_in_order() {
        let mut ctx = context();
        let spectrum = ctx.calibrate_mass(&points()).unwrap();
        assert!((spectrum.mass()[3] - 9.0).abs() < 1e-9);

        let peaks = ctx.detect_peaks(PeakAnalyzer::new(4.0, 0.0, 121.0)).unwrap();
        assert_eq!(peaks.areas(), vec![20.0, 14.0]);

        let model = ctx
            .calibrate_intensity(YCalibrationMode::NormalizeTo100, 0.0)
            .unwrap()
            .copied();
        assert_eq!(model, Some(PressureModel::Normalize { factor: 10.0 }));

        let (intensity, units) = ctx.output_intensity(true);
        assert_eq!(units, IntensityUnits::Normalized);
        assert_eq!(intensity.max(), Some(100.0));
    }

    #[test]
    fn test_missing_stage() {
        let mut ctx = context();
        let err = ctx.detect_peaks(PeakAnalyzer::new(1.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingStage {
                missing: Stage::MassCalibration,
                ..
            }
        ));

        let err = ctx
            .calibrate_intensity(YCalibrationMode::AbsolutePressure, 1e-7)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingStage { .. }));
    }

    #[test]
    fn test_failed_stage_keeps_previous_state() {
        let mut ctx = context();
        ctx.calibrate_mass(&points()).unwrap();
        ctx.detect_peaks(PeakAnalyzer::new(4.0, 0.0, 121.0)).unwrap();

        let err = ctx.detect_peaks(PeakAnalyzer::new(1e6, 0.0, 121.0)).unwrap_err();
        assert!(matches!(err, PipelineError::Peaks(_)));
        assert_eq!(ctx.analysis().unwrap().peaks.len(), 2);
    }

    #[test]
    fn test_recalibration_clears_downstream() {
        let mut ctx = context();
        ctx.calibrate_mass(&points()).unwrap();
        ctx.detect_peaks(PeakAnalyzer::new(4.0, 0.0, 121.0)).unwrap();
        ctx.calibrate_intensity(YCalibrationMode::AbsolutePressure, 4.43e-7)
            .unwrap();

        ctx.calibrate_mass(&points()).unwrap();
        assert!(ctx.analysis().is_none());
        assert!(ctx.pressure_model().is_none());
    }

    #[test]
    fn test_export_and_summary() {
        let dir = tempdir().unwrap();
        let mut ctx = context();
        ctx.calibrate_mass(&points()).unwrap();
        ctx.detect_peaks(PeakAnalyzer::new(4.0, 0.0, 121.0)).unwrap();
        ctx.calibrate_intensity(YCalibrationMode::AbsolutePressure, 4.43e-7)
            .unwrap();

        let out = dir.path().join("spectrum.txt");
        let stats = ctx.export(&out, true).unwrap();
        assert_eq!(stats.rows_written, 12);
        assert_eq!(stats.units, IntensityUnits::Pressure);
        let (mass, _) = read_spectrum(fs::File::open(&out).unwrap()).unwrap();
        assert_eq!(mass.len(), 12);

        let json = dir.path().join("summary.json");
        ctx.summary().write_json(&json).unwrap();
        let parsed: RunSummary =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(parsed.samples, 12);
        assert_eq!(parsed.y_calibration, YCalibrationMode::AbsolutePressure);
        assert_eq!(parsed.peaks.unwrap().len(), 2);
    }
}
