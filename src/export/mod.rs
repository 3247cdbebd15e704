//! # Result export
//!
//! Text exports of pipeline results. Every file is written to a temporary
//! sibling first and renamed into place only when complete, so a failed
//! export never leaves a truncated file behind.
//!
//! - [`SpectrumExporter`]: tab-separated `m/q` and intensity columns whose
//!   header and number format follow the y-calibration mode
//! - [`write_trace_values`]: a raw trace, one value per line
//! - [`write_records`]: comma-separated rows of any serializable type
//! - [`write_columns`]: named waveforms side by side

mod atomic;
mod error;
mod format;
mod spectrum;
mod tables;

pub(crate) use atomic::write_atomically;
pub use error::ExportError;
pub use format::{format_fixed, format_scientific};
pub use spectrum::{read_spectrum, ExportStats, IntensityUnits, SpectrumExporter, MASS_COLUMN};
pub use tables::{write_columns, write_records, write_trace_values};
