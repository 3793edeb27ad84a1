//! Chrome implementation of [`PageProbe`].
//!
//! `ChromeProbe` wraps a `chromiumoxide` page. On attach it subscribes to the
//! console and exception event streams and forwards them to the run's
//! [`EventSender`]; those listener tasks live until the probe is closed.

use crate::error::{ProbeError, Result};
use crate::events::{EventSender, parse_console_event, parse_exception_event};
use crate::probe::{ElementInfo, ElementSet, PageProbe};
use crate::session::Viewport;
use crate::wait::{WaitConfig, wait_for_result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    EvaluateParams, EventConsoleApiCalled, EventExceptionThrown,
};
use chromiumoxide::page::{Page as ChromePage, ScreenshotParams};
use futures::StreamExt;
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Maps every match of a selector to the fields of [`ElementInfo`].
const SNAPSHOT_FN: &str = r"(selector) => Array.from(document.querySelectorAll(selector)).map((el) => {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const attributes = {};
    for (const attr of el.attributes) attributes[attr.name] = attr.value;
    return {
        text: el.innerText ?? el.textContent ?? '',
        visible: rect.width > 0 && rect.height > 0
            && style.visibility !== 'hidden' && style.display !== 'none',
        disabled: !!el.disabled,
        opacity: parseFloat(style.opacity),
        display: style.display,
        attributes,
    };
})";

/// Event listener tasks, aborted when dropped.
#[derive(Debug, Default)]
struct Listeners(Vec<JoinHandle<()>>);

impl Drop for Listeners {
    fn drop(&mut self) {
        for listener in &self.0 {
            listener.abort();
        }
    }
}

/// A browser tab driven through the DevTools protocol.
#[derive(Debug)]
pub struct ChromeProbe {
    inner: ChromePage,
    listeners: Listeners,
}

impl ChromeProbe {
    /// Subscribes to console and exception events, then wraps the page.
    ///
    /// Subscriptions are established before this returns, so nothing logged
    /// during the first navigation is missed.
    pub(crate) async fn attach(page: ChromePage, events: EventSender) -> Result<Self> {
        let mut console = page.event_listener::<EventConsoleApiCalled>().await?;
        let mut exceptions = page.event_listener::<EventExceptionThrown>().await?;

        let console_events = events.clone();
        let console_task = tokio::spawn(async move {
            while let Some(event) = console.next().await {
                console_events.record(parse_console_event(&event));
            }
        });

        let exception_task = tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                events.record(parse_exception_event(&event));
            }
        });

        Ok(Self {
            inner: page,
            listeners: Listeners(vec![console_task, exception_task]),
        })
    }

    /// Applies device metrics and the user-agent override.
    pub(crate) async fn emulate(&self, viewport: &Viewport, user_agent: &str) -> Result<()> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.mobile)
            .build()
            .map_err(ProbeError::ConnectionFailed)?;
        self.inner.execute(metrics).await?;

        if !user_agent.is_empty() {
            self.inner
                .execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
                .await?;
        }

        debug!(
            "Emulating {}x{} (scale {}, mobile {})",
            viewport.width, viewport.height, viewport.device_scale_factor, viewport.mobile
        );
        Ok(())
    }

    /// Polls `document.readyState` until it reports `complete`.
    async fn wait_for_load(&self, config: WaitConfig) -> Result<()> {
        wait_for_result(
            move || async move {
                let state = self.evaluate("document.readyState").await?;
                Ok(state.as_str() == Some("complete"))
            },
            config,
            "document ready",
        )
        .await
    }

    /// Stops forwarding console and exception events.
    pub(crate) fn stop_events(&mut self) {
        self.listeners = Listeners::default();
    }
}

#[async_trait]
impl PageProbe for ChromeProbe {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.inner
            .goto(url)
            .await
            .map_err(|e| ProbeError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // A page that never reaches "complete" still counts as navigated; the
        // readiness gate decides whether it rendered.
        if let Err(e) = self.wait_for_load(WaitConfig::default()).await {
            warn!("Page did not finish loading: {}", e);
        }
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let value = self.evaluate("document.title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn query(&self, selector: &str) -> Result<ElementSet> {
        let escaped = serde_json::to_string(selector)?;
        let value = self
            .evaluate(&format!("({SNAPSHOT_FN})({escaped})"))
            .await?;
        let elements: Vec<ElementInfo> = serde_json::from_value(value)?;
        Ok(ElementSet::new(selector, elements))
    }

    async fn click(&self, selector: &str, index: usize) -> Result<()> {
        debug!("Clicking '{}' #{}", selector, index);
        let elements = self.inner.find_elements(selector).await?;
        let target = elements
            .get(index)
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: selector.to_string(),
                index,
            })?;
        target.click().await?;
        Ok(())
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        debug!("Clicking at ({}, {})", x, y);
        for kind in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let params = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(ProbeError::ConnectionFailed)?;
            self.inner.execute(params).await?;
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ProbeError::ScriptExecutionFailed)?;

        let result = self
            .inner
            .evaluate_expression(params)
            .await
            .map_err(|e| ProbeError::ScriptExecutionFailed(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let failed = |reason: String| ProbeError::ScreenshotFailed {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = self
            .inner
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| failed(e.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(e.to_string()))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| failed(e.to_string()))
    }
}
