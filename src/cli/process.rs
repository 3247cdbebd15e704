use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use tofcal::calibration::{CalibrationPoints, YCalibrationMode};
use tofcal::difference::DifferenceEngine;
use tofcal::export::write_trace_values;
use tofcal::peaks::PeakAnalyzer;
use tofcal::pipeline::PipelineContext;
use tofcal::waveform::{AggregateOutcome, FileOrdering, FolderAggregator};
use tofcal::worker::{AggregationWorker, WorkerEvent};

use super::config::{Config, DEFAULT_THRESHOLD, DEFAULT_TOTAL_PRESSURE};
use super::progress::file_bar;
use super::report::PeakReport;
use super::ProcessArgs;

/// Settings for one `process` run after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    measurement: PathBuf,
    background: PathBuf,
    extension: Option<String>,
    ordering: FileOrdering,
    points: CalibrationPoints,
    y_mode: YCalibrationMode,
    threshold: f64,
    window: (Option<f64>, Option<f64>),
    total_pressure: f64,
}

impl Settings {
    fn resolve(args: &ProcessArgs, config: &Config) -> Result<Self> {
        let measurement = args
            .measurement
            .clone()
            .or_else(|| config.folders.measurement.clone())
            .context("No measurement folder given (--measurement or [folders] measurement)")?;
        let background = args
            .background
            .clone()
            .or_else(|| config.folders.background.clone())
            .context("No background folder given (--background or [folders] background)")?;

        let cal = &config.calibration;
        let points = match (
            args.t1.or(cal.t1),
            args.m1.or(cal.m1),
            args.t2.or(cal.t2),
            args.m2.or(cal.m2),
        ) {
            (Some(t1), Some(m1), Some(t2), Some(m2)) => CalibrationPoints::new(t1, m1, t2, m2),
            _ => anyhow::bail!("Mass calibration needs t1, m1, t2 and m2"),
        };

        let ycal = &config.y_calibration;
        Ok(Self {
            measurement,
            background,
            extension: config.capture.extension.clone(),
            ordering: config.capture.ordering.unwrap_or_default(),
            points,
            y_mode: args
                .y_mode
                .map(YCalibrationMode::from)
                .or(ycal.mode)
                .unwrap_or_default(),
            threshold: args.threshold.or(ycal.threshold).unwrap_or(DEFAULT_THRESHOLD),
            window: (
                args.window_start.or(ycal.window_start),
                args.window_end.or(ycal.window_end),
            ),
            total_pressure: args
                .total_pressure
                .or(ycal.total_pressure)
                .unwrap_or(DEFAULT_TOTAL_PRESSURE),
        })
    }

    fn aggregator(&self, folder: &Path) -> FolderAggregator {
        let aggregator = FolderAggregator::new(folder).with_ordering(self.ordering);
        match &self.extension {
            Some(ext) => aggregator.with_extension(ext.clone()),
            None => aggregator,
        }
    }
}

/// Run the full pipeline headlessly.
pub fn run(args: ProcessArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, &config)?;

    info!("tofcal - process");
    info!("================");
    info!("Measurement: {}", settings.measurement.display());
    info!("Background:  {}", settings.background.display());
    info!("Output:      {}", args.output.display());
    info!("Y-calibration: {}", settings.y_mode);

    let engine = DifferenceEngine::new(
        settings.aggregator(&settings.measurement),
        settings.aggregator(&settings.background),
    );
    let worker = AggregationWorker::spawn(engine).context("Failed to start aggregation")?;

    let bar = file_bar(0, args.quiet);
    let outcome = worker
        .wait_with(|event| match event {
            WorkerEvent::Started { total } => bar.set_length(*total as u64),
            WorkerEvent::Progress {
                channel, processed, ..
            } => {
                bar.set_message(channel.to_string());
                bar.set_position(*processed as u64);
            }
            WorkerEvent::Finished(_) => {}
        })
        .context("Aggregation failed")?;
    bar.finish_and_clear();

    let result = match outcome {
        AggregateOutcome::Completed(result) => result,
        AggregateOutcome::Aborted => {
            println!("Aggregation aborted");
            return Ok(());
        }
    };
    info!("Measurement: {}", result.measurement);
    info!("Background:  {}", result.background);

    let mut ctx = PipelineContext::from_difference(result);

    if let Some(path) = &args.difference_out {
        let rows = write_trace_values(path, ctx.difference())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} difference values to {}", rows, path.display());
    }

    let spectrum = ctx
        .calibrate_mass(&settings.points)
        .context("Mass calibration failed")?;

    let (range_start, range_end) = spectrum.mass_range().unwrap_or((0.0, 0.0));
    let analyzer = PeakAnalyzer::new(
        settings.threshold,
        settings.window.0.unwrap_or(range_start),
        settings.window.1.unwrap_or(range_end),
    );

    // Peaks are only mandatory when the y-calibration needs them.
    match ctx.detect_peaks(analyzer) {
        Ok(peaks) => info!("{} peaks above {}", peaks.len(), settings.threshold),
        Err(e) if !settings.y_mode.requires_peaks() => log::warn!("{}", e),
        Err(e) => return Err(e).context("Peak analysis failed"),
    }

    ctx.calibrate_intensity(settings.y_mode, settings.total_pressure)
        .context("Y-calibration failed")?;

    let stats = ctx
        .export(&args.output, true)
        .with_context(|| format!("Failed to export {}", args.output.display()))?;
    info!("{}", stats);

    if let Some(path) = &args.summary_json {
        ctx.summary()
            .write_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!("{}", PeakReport::new(&ctx).format_colored());
    println!("Spectrum written to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> ProcessArgs {
        let mut argv = vec!["tofcal", "process"];
        argv.extend_from_slice(extra);
        match super::super::Cli::parse_from(argv).command {
            super::super::Commands::Process(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::from_str(
            r#"
            [folders]
            measurement = "cfg-meas"
            background = "cfg-bg"

            [calibration]
            t1 = 1.0
            m1 = 1.0
            t2 = 2.0
            m2 = 4.0

            [y_calibration]
            mode = "normalize-to-100"
            threshold = 10.0
            "#,
        )
        .unwrap();

        let settings =
            Settings::resolve(&args(&["-m", "cli-meas", "--threshold", "5"]), &config).unwrap();
        assert_eq!(settings.measurement, PathBuf::from("cli-meas"));
        assert_eq!(settings.background, PathBuf::from("cfg-bg"));
        assert_eq!(settings.threshold, 5.0);
        assert_eq!(settings.y_mode, YCalibrationMode::NormalizeTo100);
        assert_eq!(settings.total_pressure, DEFAULT_TOTAL_PRESSURE);
    }

    #[test]
    fn test_missing_calibration_is_an_error() {
        let err = Settings::resolve(
            &args(&["-m", "a", "-b", "b", "--t1", "1"]),
            &Config::default(),
        );
        assert!(err.is_err());
    }
}
