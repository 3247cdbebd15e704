use anyhow::{Context, Result};
use log::warn;
use std::path::PathBuf;

use tofcal::export::write_columns;
use tofcal::waveform::{
    list_files_with_extension, CancelToken, FileOrdering, WaveformDecoder, CAPTURE_EXTENSION,
};

/// Write the selected captures as columns of one CSV table.
pub fn run(
    folder: PathBuf,
    files: Vec<String>,
    output: PathBuf,
    ordering: FileOrdering,
    extension: Option<String>,
) -> Result<()> {
    let extension = extension.unwrap_or_else(|| CAPTURE_EXTENSION.to_string());
    let mut names = if files.is_empty() {
        list_files_with_extension(&folder, &extension, ordering)
            .with_context(|| format!("Failed to list {}", folder.display()))?
    } else {
        files
    };
    ordering.sort(&mut names);

    let decoder = WaveformDecoder::default();
    let cancel = CancelToken::new();
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let decoded = decoder.decode_file(folder.join(&name), &cancel);
        if !decoded.is_complete() {
            warn!("{} could not be read completely", name);
        }
        columns.push((name, decoded.samples));
    }

    let rows = write_columns(&output, &columns)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} waveforms ({} rows) to {}",
        columns.len(),
        rows,
        output.display()
    );
    Ok(())
}
