//! Logging setup for the flightcheck CLI.
//!
//! - `--verbose` enables debug output for the flightcheck crates
//! - `--quiet` shows errors only
//! - otherwise `RUST_LOG` applies, falling back to info
//!
//! Step progress and driver actions are logged by the library through
//! `tracing`; this module only installs the subscriber.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used by `--verbose`.
pub const VERBOSE_FILTER: &str = "flightcheck=debug,flightcheck_cli=debug";
/// Filter used by `--quiet`.
pub const QUIET_FILTER: &str = "flightcheck=error,flightcheck_cli=error";
/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "flightcheck=info,flightcheck_cli=info";

/// Pick the filter for the given flags.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber. Call once, before any logging.
///
/// ```rust,no_run
/// use flightcheck_cli::logger::init_logger;
///
/// init_logger(false, false, false);
/// tracing::info!("Starting run");
/// ```
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize with a custom filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
