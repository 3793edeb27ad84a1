//! Scripted in-memory page for unit tests.
//!
//! The DOM is a map from selector to element snapshots. Clicks run
//! registered effects against that map, which is enough to model panel
//! switches, the modal and the refresh spinner.

use crate::config::{HarnessConfig, Timings};
use crate::error::{ProbeError, Result};
use crate::events::{ConsoleEntry, EventSender};
use crate::findings::{FindingCollector, FindingKind};
use crate::probe::{ElementInfo, ElementSet, PageProbe, storage_read_script};
use crate::screenshots::ScreenshotRegistry;
use crate::session::{Session, SessionContext, SessionLauncher};
use crate::steps::{ScenarioStep, StepContext, selectors};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Effect = Box<dyn Fn(&mut Dom) + Send + Sync>;
type ClickEffect = Box<dyn Fn(&mut Dom, usize) + Send + Sync>;

/// Selector-keyed element snapshots.
#[derive(Default)]
pub(crate) struct Dom {
    nodes: HashMap<String, Vec<ElementInfo>>,
}

impl Dom {
    pub(crate) fn set(&mut self, selector: &str, elements: Vec<ElementInfo>) {
        self.nodes.insert(selector.to_string(), elements);
    }

    pub(crate) fn set_visible(&mut self, selector: &str, visible: bool) {
        for el in self.nodes.entry(selector.to_string()).or_default() {
            el.visible = visible;
        }
    }

    pub(crate) fn add_class(&mut self, selector: &str, class: &str) {
        for el in self.nodes.entry(selector.to_string()).or_default() {
            let classes = el.attributes.entry("class".to_string()).or_default();
            if !classes.is_empty() {
                classes.push(' ');
            }
            classes.push_str(class);
        }
    }

    fn query(&self, selector: &str) -> Vec<ElementInfo> {
        // Selector lists match the union of their parts, like the browser.
        selector
            .split(',')
            .map(str::trim)
            .filter_map(|part| self.nodes.get(part))
            .flatten()
            .cloned()
            .collect()
    }
}

/// A visible element with `text`.
pub(crate) fn el(text: &str) -> ElementInfo {
    ElementInfo {
        text: text.to_string(),
        visible: true,
        opacity: 1.0,
        display: "block".to_string(),
        ..ElementInfo::default()
    }
}

/// A `display: none` element.
pub(crate) fn hidden(text: &str) -> ElementInfo {
    ElementInfo {
        visible: false,
        display: "none".to_string(),
        ..el(text)
    }
}

/// Adds an attribute to an element snapshot.
pub(crate) fn attr(mut element: ElementInfo, name: &str, value: &str) -> ElementInfo {
    element.attributes.insert(name.to_string(), value.to_string());
    element
}

#[derive(Default)]
struct State {
    title: String,
    dom: Dom,
    storage: HashMap<String, String>,
    scripts: HashMap<String, serde_json::Value>,
    on_click: HashMap<String, ClickEffect>,
    on_click_at: Option<Effect>,
    panic_on_title: bool,
    fail_navigation: bool,
    fail_screenshots: bool,
    actions: Vec<String>,
    screenshots: Vec<PathBuf>,
    waited: Duration,
}

/// Scripted page.
#[derive(Default)]
pub(crate) struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_title(self, title: &str) -> Self {
        self.state.lock().title = title.to_string();
        self
    }

    pub(crate) fn with(self, selector: &str, elements: Vec<ElementInfo>) -> Self {
        self.state.lock().dom.set(selector, elements);
        self
    }

    pub(crate) fn with_storage(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .storage
            .insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn with_script(self, script: &str, value: serde_json::Value) -> Self {
        self.state.lock().scripts.insert(script.to_string(), value);
        self
    }

    /// Runs `effect` with the clicked index whenever `selector` is clicked.
    pub(crate) fn on_click(
        self,
        selector: &str,
        effect: impl Fn(&mut Dom, usize) + Send + Sync + 'static,
    ) -> Self {
        self.state
            .lock()
            .on_click
            .insert(selector.to_string(), Box::new(effect));
        self
    }

    pub(crate) fn on_click_at(self, effect: impl Fn(&mut Dom) + Send + Sync + 'static) -> Self {
        self.state.lock().on_click_at = Some(Box::new(effect));
        self
    }

    pub(crate) fn panicking_title(self) -> Self {
        self.state.lock().panic_on_title = true;
        self
    }

    pub(crate) fn failing_navigation(self) -> Self {
        self.state.lock().fail_navigation = true;
        self
    }

    pub(crate) fn failing_screenshots(self) -> Self {
        self.state.lock().fail_screenshots = true;
        self
    }

    /// Mutates the DOM directly.
    pub(crate) fn edit(&self, f: impl FnOnce(&mut Dom)) {
        f(&mut self.state.lock().dom);
    }

    /// Clicks and navigations in order.
    pub(crate) fn actions(&self) -> Vec<String> {
        self.state.lock().actions.clone()
    }

    pub(crate) fn screenshots(&self) -> Vec<PathBuf> {
        self.state.lock().screenshots.clone()
    }

    pub(crate) fn waited(&self) -> Duration {
        self.state.lock().waited
    }
}

#[async_trait]
impl PageProbe for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.actions.push(format!("navigate {url}"));
        if state.fail_navigation {
            return Err(ProbeError::NavigationFailed {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock();
        if state.panic_on_title {
            drop(state);
            panic!("title lookup exploded");
        }
        Ok(state.title.clone())
    }

    async fn query(&self, selector: &str) -> Result<ElementSet> {
        Ok(ElementSet::new(selector, self.state.lock().dom.query(selector)))
    }

    async fn click(&self, selector: &str, index: usize) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.dom.query(selector).len() <= index {
            return Err(ProbeError::ElementNotFound {
                selector: selector.to_string(),
                index,
            });
        }
        state.actions.push(format!("click {selector}[{index}]"));
        if let Some(effect) = state.on_click.get(selector) {
            effect(&mut state.dom, index);
        }
        Ok(())
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.actions.push(format!("click_at {x},{y}"));
        if let Some(effect) = &state.on_click_at {
            effect(&mut state.dom);
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let state = self.state.lock();
        if let Some(value) = state.scripts.get(script) {
            return Ok(value.clone());
        }
        for (key, value) in &state.storage {
            if storage_read_script(key)? == script {
                return Ok(serde_json::Value::String(value.clone()));
            }
        }
        if script.starts_with("localStorage.getItem(") {
            return Ok(serde_json::Value::Null);
        }
        Err(ProbeError::ScriptExecutionFailed(format!(
            "no scripted result for {script}"
        )))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_screenshots {
            return Err(ProbeError::ScreenshotFailed {
                path: path.to_path_buf(),
                reason: "capture refused".to_string(),
            });
        }
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        self.state.lock().waited += duration;
    }
}

/// Opens sessions over a shared [`FakePage`].
pub(crate) struct FakeLauncher {
    page: Arc<FakePage>,
    console: Vec<ConsoleEntry>,
    fail_open: bool,
    closes: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub(crate) fn new(page: Arc<FakePage>) -> Self {
        Self {
            page,
            console: Vec::new(),
            fail_open: false,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Entries the page "logs" as soon as the session opens.
    pub(crate) fn with_console(mut self, entries: Vec<ConsoleEntry>) -> Self {
        self.console = entries;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Number of `close()` calls that released resources.
    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn open(
        &self,
        _context: &SessionContext,
        events: EventSender,
    ) -> Result<Box<dyn Session>> {
        if self.fail_open {
            return Err(ProbeError::LaunchFailed {
                reason: "no Chrome binary".to_string(),
                source: None,
            });
        }
        for entry in &self.console {
            events.record(entry.clone());
        }
        Ok(Box::new(FakeSession {
            page: Arc::clone(&self.page),
            open: true,
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct FakeSession {
    page: Arc<FakePage>,
    open: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for FakeSession {
    fn probe(&self) -> &dyn PageProbe {
        self.page.as_ref()
    }

    async fn close(&mut self) -> Result<()> {
        if std::mem::take(&mut self.open) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Config, collector and registry for running one step at a time.
pub(crate) struct StepHarness {
    pub(crate) config: HarnessConfig,
    pub(crate) findings: FindingCollector,
    pub(crate) screenshots: ScreenshotRegistry,
}

impl StepHarness {
    pub(crate) fn new() -> Self {
        let config = HarnessConfig {
            screenshot_dir: PathBuf::from("/tmp/flightcheck-test"),
            timings: Timings::immediate(),
            ..HarnessConfig::default()
        };
        let screenshots =
            ScreenshotRegistry::new(&config.screenshot_dir, config.screenshot_prefix.clone());
        Self {
            config,
            findings: FindingCollector::new(),
            screenshots,
        }
    }

    pub(crate) async fn run(&mut self, step: &dyn ScenarioStep, probe: &dyn PageProbe) -> Result<()> {
        let mut cx = StepContext::new(
            step.id(),
            &self.config,
            &mut self.findings,
            &mut self.screenshots,
        );
        step.run(probe, &mut cx).await
    }

    pub(crate) fn kinds(&self) -> Vec<FindingKind> {
        self.findings.findings().iter().map(|f| f.kind).collect()
    }

    pub(crate) fn observed(&self, needle: &str) -> bool {
        self.findings
            .observations()
            .iter()
            .any(|o| o.message.contains(needle))
    }

    pub(crate) fn shot_names(&self) -> Vec<&str> {
        self.screenshots.shots().iter().map(|s| s.name.as_str()).collect()
    }
}

/// Shows the panel for nav control `index` and hides the others.
pub(crate) fn switch_panel(dom: &mut Dom, index: usize) {
    let panels = [
        selectors::CALENDAR_PANEL,
        selectors::UPCOMING_PANEL,
        selectors::DEPARTED_PANEL,
    ];
    for (i, panel) in panels.iter().enumerate() {
        dom.set_visible(panel, i == index);
    }
}

/// The flight calendar with two flights, every feature working.
pub(crate) fn flight_app() -> FakePage {
    use selectors::*;

    let cache = r#"[
        {"date":"2025-03-14","airline":"長榮航空","flightNo":"BR198","departureShort":"TPE","arrivalShort":"NRT"},
        {"date":"2025-03-20","airline":"長榮航空","flightNo":"BR197","departureShort":"NRT","arrivalShort":"TPE"}
    ]"#;
    let written = (chrono::Utc::now() - chrono::TimeDelta::minutes(3))
        .timestamp_millis()
        .to_string();

    FakePage::new()
        .with_title("我的飛行日曆 Flight Calendar")
        .with(HEADER_HEADING, vec![el("✈️ 飛行日曆")])
        .with(CALENDAR_PANEL, vec![el("")])
        .with(CALENDAR_WRAP, vec![el("2025年 3月")])
        .with(MONTH, vec![el("3月")])
        .with(TODAY, vec![el("14")])
        .with(EVENT, vec![el("BR198"), el("BR197")])
        .with_storage("flights_cache_v1", cache)
        .with_storage("flights_cache_ts_v1", &written)
        .with(NAV_ITEM, vec![el("日曆"), el("即將出發"), el("已出發")])
        .with(UPCOMING_PANEL, vec![hidden("")])
        .with(UPCOMING_LIST, vec![el("BR198 台北桃園 → 東京成田")])
        .with(UPCOMING_CARDS, vec![el("BR198")])
        .with(DEPARTED_PANEL, vec![hidden("")])
        .with(DEPARTED_CARDS, vec![el("BR197")])
        .on_click(NAV_ITEM, switch_panel)
        .with(MODAL, vec![hidden("")])
        .with(MODAL_BODY, vec![el("長榮航空 BR198 08:50 → 13:15")])
        .with(MODAL_CLOSE, vec![el("✕")])
        .on_click(EVENT, |dom, _| dom.set_visible(MODAL, true))
        .on_click(MODAL_CLOSE, |dom, _| dom.set_visible(MODAL, false))
        .on_click_at(|dom| dom.set_visible(MODAL, false))
        .with(REFRESH, vec![el("↻")])
        .on_click(REFRESH, |dom, _| dom.add_class(REFRESH, REFRESH_BUSY_CLASS))
        .with(BADGE, vec![attr(el("1"), BADGE_COUNT_ATTR, "1")])
        .with_script(
            crate::probe::SERVICE_WORKER_STATE_SCRIPT,
            serde_json::Value::String("active".to_string()),
        )
}
