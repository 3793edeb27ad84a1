//! Configuration loading for the run command.
//!
//! The harness configuration type itself lives in the library
//! ([`flightcheck::HarnessConfig`]); this module layers its sources and
//! validates the result.
//!
//! Priority: CLI flags > `FLIGHTCHECK_*` environment > config file > defaults

mod loading;
mod validation;

pub use loading::{CONFIG_FILE, ENV_PREFIX, load_config, load_config_in};
pub use validation::validate;
