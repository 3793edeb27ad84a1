//! Command-line interface definition for flightcheck.
//!
//! # Command Structure
//!
//! - `flightcheck run [URL]` - Drive the flight calendar through headless
//!   Chrome and report findings
//! - `flightcheck steps` - List the scenario steps in execution order

mod commands;
mod validation;

use clap::Parser;

pub use commands::{Command, RunArgs, StepsArgs};
pub use validation::parse_millis;

/// flightcheck - end-to-end checks for the flight calendar web app
#[derive(Parser, Debug)]
#[command(
    name = "flightcheck",
    version,
    about = "End-to-end checks for the flight calendar web app",
    long_about = "flightcheck opens the flight calendar in headless Chrome with phone-sized\n\
                  device emulation, walks a fixed list of UI checks and prints a report of\n\
                  everything that deviated. It exits non-zero when any check recorded a finding."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all log output except errors
    ///
    /// The report itself is still printed to stdout.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
