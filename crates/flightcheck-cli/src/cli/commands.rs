use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::parse_millis;

/// Available flightcheck subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every check against the app
    ///
    /// Opens one browser session, waits for the first render, walks the
    /// scenario steps and prints the report. Screenshots are written along
    /// the way.
    Run(RunArgs),

    /// List the scenario steps in execution order
    Steps(StepsArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// URL of the flight calendar
    ///
    /// Overrides `baseUrl` from the config file and `FLIGHTCHECK_BASE_URL`.
    ///
    /// Examples:
    ///   flightcheck run
    ///   flightcheck run http://127.0.0.1:8000
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Path to the config file
    ///
    /// Defaults to `flightcheck.config.json` in the current directory when
    /// that file exists.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory screenshots are written to
    #[arg(long, value_name = "DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chrome executable to launch instead of the auto-detected one
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Bound on the initial readiness wait, in milliseconds
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub readiness_timeout: Option<u64>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Leave informational observations out of the text report
    #[arg(long, conflicts_with = "json")]
    pub no_observations: bool,
}

/// Arguments for the steps command
#[derive(Args, Debug, Default, Clone)]
pub struct StepsArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}
