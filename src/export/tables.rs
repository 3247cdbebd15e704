use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::trace::Trace;

use super::atomic::write_atomically;
use super::error::ExportError;

/// Write a trace as one value per line, with no header.
pub fn write_trace_values<P: AsRef<Path>>(path: P, trace: &Trace) -> Result<usize, ExportError> {
    write_atomically(path.as_ref(), |w| {
        for value in trace {
            writeln!(w, "{}", value)?;
        }
        Ok(trace.len())
    })
}

/// Write serializable rows as comma-separated text. The header comes from
/// the row type's field names.
pub fn write_records<P, T>(path: P, rows: &[T]) -> Result<usize, ExportError>
where
    P: AsRef<Path>,
    T: Serialize,
{
    write_atomically(path.as_ref(), |w| {
        let mut csv = csv::Writer::from_writer(w);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(rows.len())
    })
}

/// Write named columns side by side, comma-separated.
///
/// The first line holds the column names. Shorter columns are padded with
/// empty cells so every row has one field per column.
pub fn write_columns<P: AsRef<Path>>(
    path: P,
    columns: &[(String, Vec<u32>)],
) -> Result<usize, ExportError> {
    let rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);

    write_atomically(path.as_ref(), |w| {
        let mut csv = csv::WriterBuilder::new().flexible(false).from_writer(w);
        if columns.is_empty() {
            return Ok(0);
        }
        csv.write_record(columns.iter().map(|(name, _)| name.as_str()))?;
        for row in 0..rows {
            csv.write_record(
                columns
                    .iter()
                    .map(|(_, values)| values.get(row).map(u32::to_string).unwrap_or_default()),
            )?;
        }
        csv.flush()?;
        Ok(rows)
    })
}
