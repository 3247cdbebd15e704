use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use tofcal::calibration::{CalibrationTransform, PressureModel};
use tofcal::pipeline::PipelineContext;
use tofcal::peaks::PeakSet;

/// Human-readable summary of a `process` run.
pub struct PeakReport<'a> {
    transform: Option<&'a CalibrationTransform>,
    peaks: Option<&'a PeakSet>,
    model: Option<&'a PressureModel>,
    measurement_files: usize,
    background_files: usize,
    skipped: usize,
}

impl<'a> PeakReport<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self {
            transform: ctx.transform(),
            peaks: ctx.analysis().map(|a| &a.peaks),
            model: ctx.pressure_model(),
            measurement_files: ctx.files().measurement,
            background_files: ctx.files().background,
            skipped: ctx.files().skipped.len(),
        }
    }

    fn partial_pressures(&self) -> Vec<Option<f64>> {
        let Some(peaks) = self.peaks else {
            return Vec::new();
        };
        peaks
            .iter()
            .map(|p| self.model.map(|m| m.eval(p.height)))
            .collect()
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();

            output.push_str(&format!("{}\n", style("tofcal Peak Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("==================").cyan()));
            output.push_str(&format!(
                "{}: {} measurement, {} background",
                style("Captures").bold(),
                self.measurement_files,
                self.background_files
            ));
            if self.skipped > 0 {
                output.push_str(&format!(
                    " ({})",
                    style(format!("{} skipped", self.skipped)).yellow()
                ));
            }
            output.push('\n');

            if let Some(t) = self.transform {
                output.push_str(&format!(
                    "{}: C = {:.6}, t0 = {:.3}\n",
                    style("Mass law").bold(),
                    t.c,
                    t.t0
                ));
            }
            if let Some(m) = self.model {
                output.push_str(&format!("{}: {}\n", style("Y-calibration").bold(), m));
            }
            output.push('\n');

            match self.peaks {
                Some(peaks) => {
                    output.push_str(&format!(
                        "{}\n",
                        style(format!(
                            "{:>4}  {:>10}  {:>14}  {:>21}  {:>14}  {:>14}",
                            "#", "m/q", "height", "bounds (m/q)", "area", "value"
                        ))
                        .bold()
                    ));
                    for (i, (p, v)) in peaks.iter().zip(self.partial_pressures()).enumerate() {
                        output.push_str(&format!(
                            "{:>4}  {}  {:>14.1}  {:>10.3}-{:<10.3}  {:>14.1}  {:>14}\n",
                            i + 1,
                            style(format!("{:>10.3}", p.mass)).green(),
                            p.height,
                            p.left_mass,
                            p.right_mass,
                            p.area,
                            v.map(|v| format!("{:.4e}", v)).unwrap_or_else(|| "-".to_string())
                        ));
                    }
                    output.push_str(&format!(
                        "\n{}: {} peaks, total area {:.1}\n",
                        style("Summary").bold(),
                        style(peaks.len()).green(),
                        peaks.total_area()
                    ));
                }
                None => {
                    output.push_str(&format!("{}\n", style("No peak analysis").yellow().bold()));
                }
            }

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for PeakReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tofcal Peak Report")?;
        writeln!(f, "==================")?;
        write!(
            f,
            "Captures: {} measurement, {} background",
            self.measurement_files, self.background_files
        )?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        writeln!(f)?;
        if let Some(t) = self.transform {
            writeln!(f, "Mass law: C = {:.6}, t0 = {:.3}", t.c, t.t0)?;
        }
        if let Some(m) = self.model {
            writeln!(f, "Y-calibration: {}", m)?;
        }
        writeln!(f)?;

        let Some(peaks) = self.peaks else {
            return writeln!(f, "No peak analysis");
        };
        writeln!(
            f,
            "{:>4}  {:>10}  {:>14}  {:>21}  {:>14}  {:>14}",
            "#", "m/q", "height", "bounds (m/q)", "area", "value"
        )?;
        for (i, (p, v)) in peaks.iter().zip(self.partial_pressures()).enumerate() {
            writeln!(
                f,
                "{:>4}  {:>10.3}  {:>14.1}  {:>10.3}-{:<10.3}  {:>14.1}  {:>14}",
                i + 1,
                p.mass,
                p.height,
                p.left_mass,
                p.right_mass,
                p.area,
                v.map(|v| format!("{:.4e}", v)).unwrap_or_else(|| "-".to_string())
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} peaks, total area {:.1}",
            peaks.len(),
            peaks.total_area()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tofcal::calibration::{CalibrationPoints, YCalibrationMode};
    use tofcal::peaks::PeakAnalyzer;
    use tofcal::trace::Trace;

    #[test]
    fn test_plain_report_lists_peaks() {
        let mut ctx = PipelineContext::from_trace(Trace::new(vec![
            0.0, 0.0, 5.0, 10.0, 5.0, 0.0, 0.0, 0.0, 3.0, 8.0, 3.0, 0.0,
        ]));
        ctx.calibrate_mass(&CalibrationPoints::new(2.0, 4.0, 3.0, 9.0))
            .unwrap();
        ctx.detect_peaks(PeakAnalyzer::new(4.0, 0.0, 121.0)).unwrap();
        ctx.calibrate_intensity(YCalibrationMode::NormalizeTo100, 0.0)
            .unwrap();

        let text = PeakReport::new(&ctx).to_string();
        assert!(text.contains("Summary: 2 peaks, total area 34.0"));
        assert!(text.contains("1.0000e2"));
    }

    #[test]
    fn test_report_without_peaks() {
        let ctx = PipelineContext::from_trace(Trace::new(vec![1.0, 2.0]));
        let text = PeakReport::new(&ctx).to_string();
        assert!(text.contains("No peak analysis"));
    }
}
