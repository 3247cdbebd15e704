use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use tofcal::export::write_trace_values;
use tofcal::waveform::{AggregateOutcome, CancelToken, FolderAggregator};

use super::progress::file_bar;

/// Sum one folder and write the raw trace, one value per line.
pub fn run(folder: PathBuf, output: PathBuf, extension: Option<String>, quiet: bool) -> Result<()> {
    let mut aggregator = FolderAggregator::new(&folder);
    if let Some(ext) = extension {
        aggregator = aggregator.with_extension(ext);
    }

    let total = aggregator
        .count_files()
        .with_context(|| format!("Failed to list {}", aggregator.folder().display()))?;
    let bar = file_bar(total as u64, quiet);

    let outcome = aggregator
        .sum(&CancelToken::new(), |n| bar.set_position(n as u64))
        .with_context(|| format!("Failed to sum {}", folder.display()))?;
    bar.finish_and_clear();

    let sum = match outcome {
        AggregateOutcome::Completed(sum) => sum,
        AggregateOutcome::Aborted => {
            println!("Aggregation aborted");
            return Ok(());
        }
    };
    info!("{}: {}", aggregator.folder().display(), sum);
    for path in &sum.skipped {
        eprintln!("Skipped unreadable capture: {}", path.display());
    }

    let rows = write_trace_values(&output, &sum.trace)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Summed {} captures into {} samples: {}",
        sum.files_summed,
        rows,
        output.display()
    );
    Ok(())
}
