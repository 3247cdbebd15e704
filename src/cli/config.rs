//! TOML configuration file support.
//!
//! Every setting can also be given on the command line; flags win over the
//! file.
//!
//! ```toml
//! # tofcal.toml
//! [capture]
//! extension = ".data32"
//! ordering = "numeric-suffix"
//!
//! [folders]
//! measurement = "run42/measurement"
//! background = "run42/background"
//!
//! [calibration]
//! t1 = 1250.0
//! m1 = 18.0
//! t2 = 2140.0
//! m2 = 44.0
//!
//! [y_calibration]
//! mode = "absolute-pressure"
//! threshold = 50000.0
//! window_start = 1.0
//! window_end = 50.0
//! total_pressure = 4.43e-7
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tofcal::calibration::YCalibrationMode;
use tofcal::waveform::FileOrdering;

/// Peak detection threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 50_000.0;

/// Total chamber pressure (mbar) used when none is configured.
pub const DEFAULT_TOTAL_PRESSURE: f64 = 4.43e-7;

/// Root configuration structure for tofcal.toml files.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Capture file matching.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Input folders.
    #[serde(default)]
    pub folders: FolderConfig,

    /// Mass calibration reference points.
    #[serde(default)]
    pub calibration: MassCalibrationConfig,

    /// Peak detection and y-calibration.
    #[serde(default)]
    pub y_calibration: YCalibrationConfig,
}

/// `[capture]` section.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// File-name suffix of capture files.
    pub extension: Option<String>,

    /// File ordering for listings.
    pub ordering: Option<FileOrdering>,
}

/// `[folders]` section.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Measurement capture folder.
    pub measurement: Option<PathBuf>,

    /// Background capture folder.
    pub background: Option<PathBuf>,
}

/// `[calibration]` section.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassCalibrationConfig {
    /// Sample index of the first reference peak.
    pub t1: Option<f64>,
    /// Mass/charge of the first reference peak.
    pub m1: Option<f64>,
    /// Sample index of the second reference peak.
    pub t2: Option<f64>,
    /// Mass/charge of the second reference peak.
    pub m2: Option<f64>,
}

/// `[y_calibration]` section.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct YCalibrationConfig {
    /// Y-calibration mode.
    pub mode: Option<YCalibrationMode>,

    /// Minimum peak height.
    pub threshold: Option<f64>,

    /// Inclusive m/q window start.
    pub window_start: Option<f64>,

    /// Inclusive m/q window end.
    pub window_end: Option<f64>,

    /// Known total pressure in mbar.
    pub total_pressure: Option<f64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load `path` if given, otherwise an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Configuration with every default filled in.
    pub fn with_defaults() -> Self {
        Self {
            capture: CaptureConfig {
                extension: Some(tofcal::waveform::CAPTURE_EXTENSION.to_string()),
                ordering: Some(FileOrdering::default()),
            },
            folders: FolderConfig::default(),
            calibration: MassCalibrationConfig::default(),
            y_calibration: YCalibrationConfig {
                mode: Some(YCalibrationMode::None),
                threshold: Some(DEFAULT_THRESHOLD),
                window_start: None,
                window_end: None,
                total_pressure: Some(DEFAULT_TOTAL_PRESSURE),
            },
        }
    }

    /// Serialize with a short header comment.
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        Ok(format!(
            "# tofcal configuration\n\
             # Command-line flags override these values.\n\
             # y_calibration.mode: {}\n\
             # capture.ordering: {}\n\n{}",
            YCalibrationMode::variants().join(", "),
            FileOrdering::variants().join(", "),
            body
        ))
    }

    /// Write to `path`, refusing to overwrite unless `force` is set.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [capture]
            ordering = "natural"

            [folders]
            measurement = "meas"
            background = "bg"

            [calibration]
            t1 = 100.0
            m1 = 4.0
            t2 = 200.0
            m2 = 16.0

            [y_calibration]
            mode = "absolute-pressure"
            threshold = 1200.0
            window_start = 1.5
            window_end = 40.0
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.capture.ordering, Some(FileOrdering::Natural));
        assert_eq!(config.folders.measurement, Some(PathBuf::from("meas")));
        assert_eq!(config.calibration.t1, Some(100.0));
        assert_eq!(config.calibration.m2, Some(16.0));
        assert_eq!(
            config.y_calibration.mode,
            Some(YCalibrationMode::AbsolutePressure)
        );
        assert_eq!(config.y_calibration.threshold, Some(1200.0));
        assert_eq!(config.y_calibration.total_pressure, None);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = Config::from_str("[y_calibration]\nmode = \"log-scale\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_normalize_mode_names() {
        let config = Config::from_str("[y_calibration]\nmode = \"normalize-to-100\"\n").unwrap();
        assert_eq!(
            config.y_calibration.mode,
            Some(YCalibrationMode::NormalizeTo100)
        );
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_defaults_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tofcal.toml");
        Config::with_defaults().save(&path, false).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, Config::with_defaults());
        assert!(Config::with_defaults().save(&path, false).is_err());
        assert!(Config::with_defaults().save(&path, true).is_ok());
    }
}
