//! Chrome process lifecycle.
//!
//! `ChromeLauncher` implements [`SessionLauncher`]: it spawns Chrome, opens a
//! page, attaches event capture and device emulation, and hands back a
//! `ChromeSession`. Closing the session shuts the browser down; a session
//! dropped without `close()` still kills the process through chromiumoxide's
//! own `Drop`.

use crate::error::{ProbeError, Result};
use crate::events::EventSender;
use crate::page::ChromeProbe;
use crate::probe::PageProbe;
use crate::session::{Session, SessionContext, SessionLauncher};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Settings for launching Chrome.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Run in headless mode (default: true).
    pub headless: bool,

    /// Browser window size.
    pub window_size: (u32, u32),

    /// Additional Chrome arguments.
    pub args: Vec<String>,

    /// Chrome executable path (None = auto-detect).
    pub chrome_path: Option<PathBuf>,
}

impl BrowserSettings {
    /// Enables visible mode for debugging.
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Adds additional Chrome arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config =
            BrowserConfig::builder().window_size(self.window_size.0, self.window_size.1);

        if !self.headless {
            config = config.with_head();
        }

        // A fresh profile per launch avoids ProcessSingleton lock conflicts
        // between concurrent runs.
        let user_data_dir =
            std::env::temp_dir().join(format!("flightcheck-{}", uuid::Uuid::new_v4()));
        config = config.user_data_dir(user_data_dir);

        for arg in &self.args {
            config = config.arg(arg.clone());
        }

        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path);
        }

        config.build().map_err(|e| ProbeError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (390, 844),
            args: vec![
                // Needed where user namespaces are unavailable (containers, CI).
                // Only ever pointed at the app under test.
                "--no-sandbox".to_string(),
                // Prevents /dev/shm exhaustion in containerized environments
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
        }
    }
}

/// Launches one Chrome process per session.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    /// Creates a launcher with the given settings.
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        debug!("Launching browser with settings: {:?}", self.settings);

        let config = self.settings.to_browser_config()?;
        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ProbeError::LaunchFailed {
                    reason: "failed to launch Chrome process".to_string(),
                    source: Some(Box::new(e)),
                })?;

        // chromiumoxide only processes CDP traffic while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser handler error: {}", e);
                }
            }
        });

        Ok((browser, handler_task))
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn open(
        &self,
        context: &SessionContext,
        events: EventSender,
    ) -> Result<Box<dyn Session>> {
        let (browser, handler) = self.launch().await?;
        let mut session = ChromeSession {
            browser: Some(browser),
            handler: Some(handler),
            probe: None,
        };

        // Any failure past this point still shuts the fresh browser down.
        match session.prepare(context, events).await {
            Ok(()) => {
                debug!("Session ready for {}", context.target_url);
                Ok(Box::new(session))
            }
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    warn!("Failed to close browser after setup error: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

/// A live Chrome process with one page.
#[derive(Debug)]
pub struct ChromeSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    probe: Option<ChromeProbe>,
}

impl ChromeSession {
    async fn prepare(&mut self, context: &SessionContext, events: EventSender) -> Result<()> {
        let browser = self.browser.as_ref().ok_or(ProbeError::AlreadyClosed)?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::ConnectionFailed(e.to_string()))?;

        let probe = ChromeProbe::attach(page, events).await?;
        probe.emulate(&context.viewport, &context.user_agent).await?;
        self.probe = Some(probe);
        Ok(())
    }

    /// Returns true once the browser has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.browser.is_none()
    }
}

#[async_trait]
impl Session for ChromeSession {
    fn probe(&self) -> &dyn PageProbe {
        match &self.probe {
            Some(probe) => probe,
            None => &ClosedProbe,
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(probe) = self.probe.as_mut() {
            probe.stop_events();
        }

        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        debug!("Closing browser gracefully");
        let closed = browser
            .close()
            .await
            .map_err(|e| ProbeError::ConnectionFailed(e.to_string()));
        if let Err(e) = browser.wait().await {
            warn!("Waiting for Chrome to exit failed: {}", e);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        closed.map(|_| ())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            // chromiumoxide's Browser::drop kills the child process.
            warn!("ChromeSession dropped without close() - forcing shutdown via Drop");
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Stand-in probe for a session whose page is gone; every call fails.
struct ClosedProbe;

#[async_trait]
impl PageProbe for ClosedProbe {
    async fn navigate(&self, _url: &str) -> Result<()> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn title(&self) -> Result<String> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn query(&self, _selector: &str) -> Result<crate::probe::ElementSet> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn click(&self, _selector: &str, _index: usize) -> Result<()> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn click_at(&self, _x: f64, _y: f64) -> Result<()> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value> {
        Err(ProbeError::AlreadyClosed)
    }

    async fn screenshot(&self, _path: &std::path::Path) -> Result<()> {
        Err(ProbeError::AlreadyClosed)
    }
}
