//! # tofcal
//!
//! Command-line front end for summing and calibrating time-of-flight
//! waveform captures.
//!
//! ## Usage
//!
//! ```bash
//! # Write a config file to edit
//! tofcal init-config tofcal.toml
//!
//! # Full pipeline from the config
//! tofcal process --config tofcal.toml -o spectrum.txt
//!
//! # Sum one folder
//! tofcal sum captures/ -o sum.txt
//!
//! # Maximum of every 10th capture between samples 2000 and 3000
//! tofcal survey captures/ --skip 10 --x-min 2000 --x-max 3000
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
