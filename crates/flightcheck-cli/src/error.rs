//! Error handling for the flightcheck CLI.
//!
//! `CliError` is what commands return. Configuration problems carry the
//! offending field and a hint; a run that recorded findings is also an
//! error so the process exits non-zero.

mod diagnostic;

pub use diagnostic::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by every command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, bad value, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Screenshot directory creation and other file system failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the report or step catalog failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The run completed and recorded findings
    #[error("{count} finding(s) recorded")]
    ChecksFailed {
        /// Number of findings in the report
        count: usize,
    },

    /// An error prefixed with what was being attempted
    #[error("{0}")]
    Custom(String),
}

/// Problems found while layering or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create flightcheck.config.json or pass --config <path>", .0.display())]
    NotFound(PathBuf),

    /// A layer could not be merged into the configuration
    #[error("Invalid value for '{field}': {message}\n\nHint: {hint}")]
    Extract {
        /// Dotted path of the field, or "configuration" for the whole document
        field: String,
        /// What figment reported
        message: String,
        /// Helpful hint
        hint: String,
    },

    /// A value the runner cannot work with
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Dotted camelCase path of the field
        field: String,
        /// The invalid value
        value: String,
        /// What an acceptable value looks like
        hint: String,
    },
}

/// Result alias for command code.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Attach context to any error convertible into `CliError`.
pub trait ResultExt<T> {
    /// Prefix the error with a message.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use flightcheck_cli::error::{Result, ResultExt};
    /// # fn run() -> Result<()> {
    /// std::fs::create_dir_all("/screenshots")
    ///     .context("Failed to create screenshot directory")?;
    /// # Ok(())
    /// # }
    /// ```
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}
