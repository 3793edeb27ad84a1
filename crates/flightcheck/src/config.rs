//! Harness configuration.
//!
//! Every field has a default that matches the flight calendar served locally
//! on port 8000 and viewed on a phone-sized screen, so an empty config file is
//! a valid config. Durations are stored as milliseconds to keep the file and
//! environment representations flat.

use crate::browser::BrowserSettings;
use crate::session::{SessionContext, Viewport};
use crate::wait::WaitConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// iOS Safari user agent the app is normally viewed with.
pub const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15";

/// Top-level configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarnessConfig {
    /// URL of the flight calendar under test
    pub base_url: String,

    /// Emulated device metrics
    pub viewport: Viewport,

    /// User-agent override; empty keeps the browser default
    pub user_agent: String,

    /// Run Chrome without a window
    pub headless: bool,

    /// Chrome executable (None = auto-detect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Where screenshots are written
    pub screenshot_dir: PathBuf,

    /// Prepended to every screenshot file name
    pub screenshot_prefix: String,

    /// The page title must contain at least one of these
    pub title_markers: Vec<String>,

    /// Client-storage keys written by the app
    pub storage: StorageKeys,

    /// Waits and settle delays
    pub timings: Timings,

    /// Console entries kept before new ones are dropped
    pub console_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            viewport: Viewport::default(),
            user_agent: MOBILE_USER_AGENT.to_string(),
            headless: !cfg!(feature = "visible"),
            chrome_path: None,
            screenshot_dir: std::env::temp_dir(),
            screenshot_prefix: "debug_".to_string(),
            title_markers: vec!["飛行".to_string(), "Flight".to_string()],
            storage: StorageKeys::default(),
            timings: Timings::default(),
            console_capacity: 1024,
        }
    }
}

impl HarnessConfig {
    /// The session the runner opens.
    #[must_use]
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            target_url: self.base_url.clone(),
            viewport: self.viewport.clone(),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Chrome launch settings.
    #[must_use]
    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            headless: self.headless,
            window_size: (self.viewport.width, self.viewport.height),
            chrome_path: self.chrome_path.clone(),
            ..BrowserSettings::default()
        }
    }
}

/// `localStorage` keys holding the cached flight list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageKeys {
    /// Serialized flight list
    pub cache_key: String,
    /// Epoch milliseconds when the list was written
    pub timestamp_key: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            cache_key: "flights_cache_v1".to_string(),
            timestamp_key: "flights_cache_ts_v1".to_string(),
        }
    }
}

/// Wait bounds and fixed delays, all in milliseconds.
///
/// The settle delays stand in for a readiness signal the app does not expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    /// Bound on the initial readiness wait
    pub readiness_ms: u64,
    /// Poll interval for bounded waits
    pub poll_ms: u64,
    /// After switching to the upcoming or departed panel
    pub panel_settle_ms: u64,
    /// After switching back to the calendar
    pub back_settle_ms: u64,
    /// After clicking an event cell
    pub modal_open_settle_ms: u64,
    /// After closing the modal
    pub modal_close_settle_ms: u64,
    /// Bound on the refresh control turning busy
    pub refresh_busy_timeout_ms: u64,
    /// After the refresh check, so the reload does not bleed into later steps
    pub refresh_settle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            readiness_ms: 25_000,
            poll_ms: 100,
            panel_settle_ms: 500,
            back_settle_ms: 300,
            modal_open_settle_ms: 500,
            modal_close_settle_ms: 400,
            refresh_busy_timeout_ms: 500,
            refresh_settle_ms: 2_000,
        }
    }
}

impl Timings {
    /// Every delay set to zero and every bound to one poll. Used by tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            readiness_ms: 0,
            poll_ms: 1,
            panel_settle_ms: 0,
            back_settle_ms: 0,
            modal_open_settle_ms: 0,
            modal_close_settle_ms: 0,
            refresh_busy_timeout_ms: 0,
            refresh_settle_ms: 0,
        }
    }

    /// Readiness gate bounds.
    #[must_use]
    pub fn readiness(&self) -> WaitConfig {
        WaitConfig::new(ms(self.readiness_ms), ms(self.poll_ms))
    }

    /// Refresh busy-state bounds.
    #[must_use]
    pub fn refresh_busy(&self) -> WaitConfig {
        WaitConfig::new(ms(self.refresh_busy_timeout_ms), ms(self.poll_ms))
    }
}

/// Milliseconds to `Duration`.
#[must_use]
pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
