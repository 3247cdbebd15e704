use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::{PressureModel, YCalibrationMode};

use super::atomic::write_atomically;
use super::error::ExportError;
use super::format::{format_fixed, format_scientific};

/// What the intensity column holds, which fixes the header and number format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityUnits {
    /// Background-subtracted counts.
    #[default]
    Counts,
    /// Partial pressure in mbar.
    Pressure,
    /// Intensity scaled so the tallest peak is 100.
    Normalized,
}

impl IntensityUnits {
    /// Units produced by a y-calibration mode.
    pub fn for_mode(mode: YCalibrationMode) -> Self {
        match mode {
            YCalibrationMode::None => Self::Counts,
            YCalibrationMode::AbsolutePressure => Self::Pressure,
            YCalibrationMode::NormalizeTo100 => Self::Normalized,
        }
    }

    /// Units produced by an optional fitted model.
    pub fn for_model(model: Option<&PressureModel>) -> Self {
        model.map_or(Self::Counts, |m| Self::for_mode(m.mode()))
    }

    /// Header of the intensity column.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Counts => "intensity",
            Self::Pressure => "pressure (mbar)",
            Self::Normalized => "norm intensity",
        }
    }

    /// Render one intensity value.
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::Pressure => format_scientific(value, 9),
            Self::Counts | Self::Normalized => format_fixed(value, 6),
        }
    }
}

impl fmt::Display for IntensityUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Header of the mass column.
pub const MASS_COLUMN: &str = "m/q";

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStats {
    /// Data rows written (header excluded).
    pub rows_written: usize,
    /// Units of the intensity column.
    pub units: IntensityUnits,
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrote {} rows ({})", self.rows_written, self.units)
    }
}

/// Writes a calibrated spectrum as tab-separated text.
///
/// ```text
/// m/q<TAB>intensity
/// 1.000000<TAB>12.500000
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectrumExporter {
    units: IntensityUnits,
}

impl SpectrumExporter {
    /// Exporter for the given intensity units.
    pub fn new(units: IntensityUnits) -> Self {
        Self { units }
    }

    /// Units of the intensity column.
    pub fn units(&self) -> IntensityUnits {
        self.units
    }

    /// Write header and rows to any writer.
    pub fn write_to<W: Write>(
        &self,
        writer: W,
        mass: &[f64],
        intensity: &[f64],
    ) -> Result<usize, ExportError> {
        if mass.len() != intensity.len() {
            return Err(ExportError::ColumnMismatch {
                mass: mass.len(),
                intensity: intensity.len(),
            });
        }

        let mut csv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        csv.write_record([MASS_COLUMN, self.units.column_name()])?;
        for (&m, &y) in mass.iter().zip(intensity) {
            csv.write_record([format_fixed(m, 6), self.units.format(y)])?;
        }
        csv.flush()?;
        Ok(mass.len())
    }

    /// Write to `path`, replacing it only once every row has been written.
    pub fn export<P: AsRef<Path>>(
        &self,
        path: P,
        mass: &[f64],
        intensity: &[f64],
    ) -> Result<ExportStats, ExportError> {
        let path = path.as_ref();
        let rows_written = write_atomically(path, |w| self.write_to(w, mass, intensity))?;
        log::info!(
            "Exported {} rows ({}) to {}",
            rows_written,
            self.units,
            path.display()
        );
        Ok(ExportStats {
            rows_written,
            units: self.units,
        })
    }
}

/// Parse an export back into `(mass, intensity)` columns. The header row is
/// skipped.
pub fn read_spectrum<R: Read>(reader: R) -> Result<(Vec<f64>, Vec<f64>), ExportError> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let mut mass = Vec::new();
    let mut intensity = Vec::new();
    for record in csv.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let parse = |field: Option<&str>| -> Result<f64, ExportError> {
            let text = field.unwrap_or_default();
            text.trim().parse().map_err(|_| ExportError::InvalidValue {
                value: text.to_string(),
                line,
            })
        };
        mass.push(parse(record.get(0))?);
        intensity.push(parse(record.get(1))?);
    }
    Ok((mass, intensity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn render(units: IntensityUnits, mass: &[f64], intensity: &[f64]) -> String {
        let mut buf = Vec::new();
        SpectrumExporter::new(units)
            .write_to(&mut buf, mass, intensity)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_counts_layout() {
        let text = render(IntensityUnits::Counts, &[1.0, 2.5], &[10.0, 0.125]);
        assert_eq!(
            text,
            "m/q\tintensity\n1.000000\t10.000000\n2.500000\t0.125000\n"
        );
    }

    #[test]
    fn test_pressure_layout() {
        let text = render(IntensityUnits::Pressure, &[18.0], &[4.43e-7]);
        assert_eq!(text, "m/q\tpressure (mbar)\n18.000000\t4.430000000e-07\n");
    }

    #[test]
    fn test_normalized_header() {
        let text = render(IntensityUnits::Normalized, &[], &[]);
        assert_eq!(text, "m/q\tnorm intensity\n");
    }

    #[test]
    fn test_mismatched_columns() {
        let err = SpectrumExporter::default()
            .write_to(Vec::new(), &[1.0, 2.0], &[1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::ColumnMismatch {
                mass: 2,
                intensity: 1
            }
        ));
    }

    #[test]
    fn test_export_reparses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spectrum.txt");
        let mass = vec![0.25, 1.0, 4.0];
        let pressure = vec![1.5e-9, 2.25e-7, 0.0];

        let stats = SpectrumExporter::new(IntensityUnits::Pressure)
            .export(&path, &mass, &pressure)
            .unwrap();
        assert_eq!(stats.rows_written, 3);

        let (m, p) = read_spectrum(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(m, mass);
        for (a, b) in p.iter().zip(&pressure) {
            assert!((a - b).abs() <= b.abs() * 1e-9);
        }
    }

    #[test]
    fn test_units_follow_mode() {
        assert_eq!(
            IntensityUnits::for_mode(YCalibrationMode::AbsolutePressure),
            IntensityUnits::Pressure
        );
        assert_eq!(IntensityUnits::for_model(None), IntensityUnits::Counts);
        let model = PressureModel::Normalize { factor: 2.0 };
        assert_eq!(
            IntensityUnits::for_model(Some(&model)),
            IntensityUnits::Normalized
        );
    }
}
