//! flightcheck - end-to-end checks for the flight calendar.
//!
//! Parses arguments, initializes logging and dispatches to a command.

use clap::Parser;
use flightcheck_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Run(run_args) => commands::run_execute(run_args).await,
        cli::Command::Steps(steps_args) => commands::steps_execute(&steps_args),
    };

    result.map_err(error::cli_error_to_miette)
}
