//! # flightcheck
//!
//! End-to-end verification of the flight calendar web app through headless
//! Chrome (chromiumoxide).
//!
//! A run opens one browser session with phone-sized device emulation, waits
//! for the app's first render, walks a fixed list of scenario steps, takes a
//! final screenshot and closes the session. Steps never abort the run: what
//! they find goes into a list of [`Finding`]s, and a run with no findings
//! passes.
//!
//! ## Architecture
//!
//! - **PageProbe**: what a step may do to the page (query, click, evaluate,
//!   screenshot). Queries never fail on zero matches; clicks do.
//! - **SessionLauncher / Session**: acquire and release the browser.
//!   [`ChromeLauncher`] is the real implementation.
//! - **EventSink**: bounded queue fed by console and page-error listeners,
//!   drained once the session is closed.
//! - **Steps**: the verification units, run in the order of
//!   [`steps::catalog`].
//! - **ScenarioRunner**: the `Init → Loading → Ready|TimedOut → Executing →
//!   Finalizing → Done` state machine producing a [`RunReport`].
//! - **ReportGenerator**: plain-text rendering of the report.
//!
//! ## Example
//!
//! ```ignore
//! use flightcheck::{ChromeLauncher, HarnessConfig, ReportGenerator, ScenarioRunner};
//!
//! let config = HarnessConfig::default();
//! let launcher = ChromeLauncher::new(config.browser_settings());
//! let report = ScenarioRunner::new(config).run(&launcher).await;
//! println!("{}", ReportGenerator::default().render(&report));
//! ```
//!
//! Unit tests drive the steps and the runner through a scripted in-memory
//! page. Tests against a real Chrome live in `tests/` and are `#[ignore]`d;
//! run them with `cargo test -- --ignored`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod findings;
pub mod page;
pub mod probe;
pub mod report;
pub mod runner;
pub mod screenshots;
pub mod session;
pub mod steps;
pub mod wait;

#[cfg(test)]
mod fake;

pub use browser::{BrowserSettings, ChromeLauncher, ChromeSession};
pub use config::{HarnessConfig, StorageKeys, Timings};
pub use error::{ProbeError, Result};
pub use events::{ConsoleEntry, ConsoleLevel, ConsoleLog, EventSender, EventSink};
pub use findings::{Finding, FindingCollector, FindingKind, Observation, Origin};
pub use page::ChromeProbe;
pub use probe::{ElementInfo, ElementSet, PageProbe, Presence};
pub use report::ReportGenerator;
pub use runner::{ReadyState, RunPhase, RunReport, ScenarioRunner, StepOutcome, StepRecord};
pub use screenshots::{Screenshot, ScreenshotRegistry};
pub use session::{Session, SessionContext, SessionLauncher, Viewport};
pub use steps::{ScenarioStep, StepContext, StepId};
pub use wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitConfig};
