use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tofcal::calibration::YCalibrationMode;
use tofcal::waveform::FileOrdering;

mod config;
mod process;
mod progress;
mod report;
mod sum;
mod survey;
mod waveforms;

pub use config::Config;

/// tofcal - Time-of-flight waveform summation and calibration
#[derive(Parser)]
#[command(name = "tofcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Y-calibration mode as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum YModeArg {
    /// Raw intensities
    None,
    /// Peak height to partial pressure fit
    AbsolutePressure,
    /// Tallest peak scaled to 100
    #[value(name = "normalize-to-100")]
    NormalizeTo100,
}

impl From<YModeArg> for YCalibrationMode {
    fn from(arg: YModeArg) -> Self {
        match arg {
            YModeArg::None => YCalibrationMode::None,
            YModeArg::AbsolutePressure => YCalibrationMode::AbsolutePressure,
            YModeArg::NormalizeTo100 => YCalibrationMode::NormalizeTo100,
        }
    }
}

/// File ordering as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderingArg {
    /// Directory listing order
    Listing,
    /// Shot number after the Ch<n>_ tag
    NumericSuffix,
    /// Natural sort
    Natural,
}

impl From<OrderingArg> for FileOrdering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Listing => FileOrdering::Listing,
            OrderingArg::NumericSuffix => FileOrdering::NumericSuffix,
            OrderingArg::Natural => FileOrdering::Natural,
        }
    }
}

/// Options of the `process` command. Unset values fall back to the config file.
#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Measurement capture folder
    #[arg(short = 'm', long, value_name = "DIR")]
    measurement: Option<PathBuf>,

    /// Background capture folder
    #[arg(short = 'b', long, value_name = "DIR")]
    background: Option<PathBuf>,

    /// Spectrum output file
    #[arg(short = 'o', long, value_name = "FILE", default_value = "spectrum.txt")]
    output: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sample index of the first reference peak
    #[arg(long)]
    t1: Option<f64>,

    /// Mass/charge of the first reference peak
    #[arg(long)]
    m1: Option<f64>,

    /// Sample index of the second reference peak
    #[arg(long)]
    t2: Option<f64>,

    /// Mass/charge of the second reference peak
    #[arg(long)]
    m2: Option<f64>,

    /// Y-calibration mode
    #[arg(short = 'y', long, value_enum)]
    y_mode: Option<YModeArg>,

    /// Minimum peak height
    #[arg(long)]
    threshold: Option<f64>,

    /// Peak window start (m/q)
    #[arg(long)]
    window_start: Option<f64>,

    /// Peak window end (m/q)
    #[arg(long)]
    window_end: Option<f64>,

    /// Known total pressure (mbar)
    #[arg(long)]
    total_pressure: Option<f64>,

    /// Also write the uncalibrated difference trace
    #[arg(long, value_name = "FILE")]
    difference_out: Option<PathBuf>,

    /// Also write a JSON run summary
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sum, subtract, calibrate and export a measurement/background pair
    Process(ProcessArgs),

    /// Sum every capture in one folder and write the raw trace
    Sum {
        /// Capture folder
        #[arg(value_name = "DIR")]
        folder: PathBuf,

        /// Output file, one value per line
        #[arg(short = 'o', long, value_name = "FILE", default_value = "sum.txt")]
        output: PathBuf,

        /// Capture file extension
        #[arg(long)]
        extension: Option<String>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Record the maximum sample of each capture over time
    Survey {
        /// Capture folder
        #[arg(value_name = "DIR")]
        folder: PathBuf,

        /// Output CSV file
        #[arg(short = 'o', long, value_name = "FILE", default_value = "max_values.csv")]
        output: PathBuf,

        /// Keep every n-th capture
        #[arg(long, default_value_t = 1)]
        skip: usize,

        /// First sample index of the range
        #[arg(long, default_value_t = 0)]
        x_min: usize,

        /// End of the sample range (exclusive)
        #[arg(long)]
        x_max: Option<usize>,

        /// Capture file extension
        #[arg(long)]
        extension: Option<String>,
    },

    /// Write selected captures side by side as a CSV table
    Waveforms {
        /// Capture folder
        #[arg(value_name = "DIR")]
        folder: PathBuf,

        /// Capture file names (all captures when omitted)
        #[arg(value_name = "FILES")]
        files: Vec<String>,

        /// Output CSV file
        #[arg(short = 'o', long, value_name = "FILE", default_value = "waveforms.csv")]
        output: PathBuf,

        /// Column order
        #[arg(long, value_enum, default_value = "natural")]
        ordering: OrderingArg,

        /// Capture file extension
        #[arg(long)]
        extension: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination
        #[arg(value_name = "PATH", default_value = "tofcal.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process(args) => process::run(args),
        Commands::Sum {
            folder,
            output,
            extension,
            quiet,
        } => sum::run(folder, output, extension, quiet),
        Commands::Survey {
            folder,
            output,
            skip,
            x_min,
            x_max,
            extension,
        } => survey::run(folder, output, skip, x_min, x_max, extension),
        Commands::Waveforms {
            folder,
            files,
            output,
            ordering,
            extension,
        } => waveforms::run(folder, files, output, FileOrdering::from(ordering), extension),
        Commands::InitConfig { path, force } => {
            Config::with_defaults().save(&path, force)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}
