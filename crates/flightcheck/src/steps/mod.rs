//! The scenario step library.
//!
//! Each step is a self-contained check against the current page. Steps run
//! in the fixed order returned by [`catalog`]. They share nothing except page
//! state and the [`StepContext`] they record into. A step returns `Err` only
//! when a driver operation fails or an action's target is missing; every
//! other deviation is recorded as a finding and the step returns `Ok`.

mod cache;
mod controls;
mod layout;
mod modal;
mod navigation;
pub mod selectors;
mod service_worker;

pub use cache::{CacheError, CacheValidation, FlightRecord, cache_age, parse_flight_cache};
pub use controls::{BadgeCount, RefreshControl};
pub use layout::{CalendarPanel, EmptyCalendar, HeaderCheck, TitleCheck, classify_empty_calendar};
pub use modal::ModalOpenClose;
pub use navigation::{NavBack, NavDeparted, NavUpcoming};
pub use service_worker::{ServiceWorkerCheck, ServiceWorkerState};

use crate::config::{HarnessConfig, ms};
use crate::error::Result;
use crate::findings::{FindingCollector, FindingKind, Origin};
use crate::probe::PageProbe;
use crate::screenshots::ScreenshotRegistry;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Identifies a step in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Title,
    Header,
    CalendarPanel,
    CacheValidation,
    NavUpcoming,
    NavDeparted,
    NavBack,
    Modal,
    RefreshControl,
    BadgeCount,
    ServiceWorker,
}

impl StepId {
    /// Kebab-case identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Title => "title",
            StepId::Header => "header",
            StepId::CalendarPanel => "calendar-panel",
            StepId::CacheValidation => "cache-validation",
            StepId::NavUpcoming => "nav-upcoming",
            StepId::NavDeparted => "nav-departed",
            StepId::NavBack => "nav-back",
            StepId::Modal => "modal",
            StepId::RefreshControl => "refresh-control",
            StepId::BadgeCount => "badge-count",
            StepId::ServiceWorker => "service-worker",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verification unit.
#[async_trait]
pub trait ScenarioStep: Send + Sync {
    /// Stable identifier.
    fn id(&self) -> StepId;

    /// One-line description for listings and logs.
    fn description(&self) -> &'static str;

    /// Runs the check, recording findings into `cx`.
    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()>;
}

/// The steps in execution order.
#[must_use]
pub fn catalog() -> Vec<Box<dyn ScenarioStep>> {
    vec![
        Box::new(TitleCheck),
        Box::new(HeaderCheck),
        Box::new(CalendarPanel),
        Box::new(CacheValidation),
        Box::new(NavUpcoming),
        Box::new(NavDeparted),
        Box::new(NavBack),
        Box::new(ModalOpenClose),
        Box::new(RefreshControl),
        Box::new(BadgeCount),
        Box::new(ServiceWorkerCheck),
    ]
}

/// What a running step can record into.
pub struct StepContext<'a> {
    step: StepId,
    config: &'a HarnessConfig,
    findings: &'a mut FindingCollector,
    screenshots: &'a mut ScreenshotRegistry,
}

impl<'a> StepContext<'a> {
    /// Context for `step`.
    pub fn new(
        step: StepId,
        config: &'a HarnessConfig,
        findings: &'a mut FindingCollector,
        screenshots: &'a mut ScreenshotRegistry,
    ) -> Self {
        Self {
            step,
            config,
            findings,
            screenshots,
        }
    }

    /// The running step.
    #[must_use]
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        self.config
    }

    /// Records a finding attributed to this step.
    pub fn finding(&mut self, kind: FindingKind, message: impl Into<String>) {
        self.findings.record(kind, Origin::Step(self.step), message);
    }

    /// Records an observation attributed to this step.
    pub fn observe(&mut self, message: impl Into<String>) {
        self.findings.observe(Origin::Step(self.step), message);
    }

    /// Captures a named full-page screenshot.
    pub async fn screenshot(&mut self, probe: &dyn PageProbe, name: &str) -> Result<()> {
        self.screenshots.capture(probe, name).await.map(|_| ())
    }

    /// Fixed pause after an interaction.
    pub async fn settle(&self, probe: &dyn PageProbe, millis: u64) {
        if millis > 0 {
            probe.wait(ms(millis)).await;
        }
    }
}

/// First `max` characters of `text`, trimmed, with an ellipsis when cut.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push('…');
    }
    out
}
