//! flightcheck CLI library.
//!
//! The binary in `main.rs` is a thin shell over these modules so that
//! argument parsing and configuration layering can be tested directly.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;
