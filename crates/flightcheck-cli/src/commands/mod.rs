//! Command implementations.
//!
//! - [`run`] - Drive the app and report findings
//! - [`steps`] - List the scenario steps

pub mod run;
pub mod steps;

pub use run::execute as run_execute;
pub use steps::execute as steps_execute;
