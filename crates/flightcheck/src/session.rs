//! Session lifecycle seams.
//!
//! A session is one browser context and page, opened once per run and
//! closed exactly once. The runner only sees these traits, which keeps the
//! Chrome-specific lifecycle in [`crate::browser`].

use crate::error::Result;
use crate::events::EventSender;
use crate::probe::PageProbe;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Emulated device metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Viewport {
    /// CSS pixels
    pub width: u32,
    /// CSS pixels
    pub height: u32,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Emulate a mobile device (meta viewport, touch-sized layout)
    pub mobile: bool,
}

impl Default for Viewport {
    /// iPhone 14.
    fn default() -> Self {
        Self {
            width: 390,
            height: 844,
            device_scale_factor: 3.0,
            mobile: true,
        }
    }
}

/// What the runner asks a launcher for.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /// Page to navigate to once the session is open
    pub target_url: String,
    /// Device metrics applied before navigation
    pub viewport: Viewport,
    /// User-agent override; empty keeps the default
    pub user_agent: String,
}

/// An open browser session.
#[async_trait]
pub trait Session: Send {
    /// The page driven by scenario steps.
    fn probe(&self) -> &dyn PageProbe;

    /// Releases the page, context and browser process.
    ///
    /// Must be idempotent: a second call is a no-op returning `Ok`.
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Acquires a browser session configured per `context`.
    ///
    /// Console and page-error events for the session go to `events`.
    /// Navigation is left to the caller.
    async fn open(
        &self,
        context: &SessionContext,
        events: EventSender,
    ) -> Result<Box<dyn Session>>;
}
