use anyhow::{Context, Result};
use std::path::PathBuf;

use tofcal::survey::IntensitySurvey;
use tofcal::waveform::{AggregateOutcome, CancelToken};

/// Survey per-capture maxima and write them as CSV.
pub fn run(
    folder: PathBuf,
    output: PathBuf,
    skip: usize,
    x_min: usize,
    x_max: Option<usize>,
    extension: Option<String>,
) -> Result<()> {
    let mut survey = IntensitySurvey::new(&folder)
        .with_skip(skip)
        .with_range(x_min, x_max);
    if let Some(ext) = extension {
        survey = survey.with_extension(ext);
    }

    let report = match survey
        .run(&CancelToken::new(), |_| {})
        .with_context(|| format!("Failed to survey {}", folder.display()))?
    {
        AggregateOutcome::Completed(report) => report,
        AggregateOutcome::Aborted => {
            println!("Survey aborted");
            return Ok(());
        }
    };

    for name in report.missing() {
        eprintln!("No value for {}", name);
    }
    let rows = report
        .export(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{}; {} rows written to {}", report, rows, output.display());
    Ok(())
}
