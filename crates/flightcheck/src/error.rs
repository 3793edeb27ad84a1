//! Error types for browser-driving operations.
//!
//! `ProbeError` separates the failure modes a scenario step can hit: the
//! browser never came up, navigation failed, a script blew up inside the page,
//! or an action targeted an element that was not there. Steps propagate these
//! with `?`; the runner turns whatever escapes a step into a Fatal finding.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The error type for all probe and session operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Failed to launch the browser process.
    ///
    /// This typically occurs when Chrome/Chromium is not installed,
    /// or when there are permission issues with the executable.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to establish or use the Chrome DevTools Protocol connection.
    #[error("CDP connection failed: {0}")]
    ConnectionFailed(String),

    /// Navigation to a URL could not complete (network or DNS level).
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailed {
        /// The URL that failed to load
        url: String,
        /// Reason for the navigation failure
        reason: String,
    },

    /// A wait condition was not satisfied within the timeout.
    #[error("wait condition '{condition}' timed out after {timeout:?}")]
    WaitTimeout {
        /// Description of the condition that timed out
        condition: String,
        /// How long we waited before timing out
        timeout: Duration,
    },

    /// JavaScript execution in the page context failed.
    #[error("JavaScript execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// An action required an element that does not exist.
    ///
    /// Querying never produces this; only clicks do.
    #[error("no element matches '{selector}' at index {index}")]
    ElementNotFound {
        /// Selector the action targeted
        selector: String,
        /// Zero-based index within the matches
        index: usize,
    },

    /// Capturing or writing a screenshot failed.
    #[error("screenshot '{}' failed: {reason}", .path.display())]
    ScreenshotFailed {
        /// Destination of the capture
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// An operation was attempted on a closed session.
    #[error("browser session is already closed")]
    AlreadyClosed,

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),

    /// Generic I/O errors (file access, network, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value returned from the page did not have the expected shape.
    #[error("unexpected page data: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
