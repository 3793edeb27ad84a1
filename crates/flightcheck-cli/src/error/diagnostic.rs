//! Miette diagnostic conversion for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::ChecksFailed { count } => miette::miette!(
            help = "Screenshots and console output are listed in the report above",
            "flightcheck recorded {} finding(s)",
            count
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_failed_has_help() {
        let report = cli_error_to_miette(CliError::ChecksFailed { count: 2 });
        assert_eq!(report.to_string(), "flightcheck recorded 2 finding(s)");
        assert!(report.help().is_some());
    }

    #[test]
    fn test_other_errors_keep_message() {
        let report = cli_error_to_miette(CliError::Custom("bad".to_string()));
        assert_eq!(report.to_string(), "bad");
    }
}
