//! Static page structure: title, header, calendar.

use super::selectors::{
    CALENDAR_WRAP, HEADER_HEADING, LOAD_FAILED_TEXTS, MONTH, NO_FLIGHTS_TEXT, TODAY,
};
use super::{ScenarioStep, StepContext, StepId, excerpt};
use crate::error::Result;
use crate::findings::FindingKind;
use crate::probe::{PageProbe, Presence};
use async_trait::async_trait;

pub struct TitleCheck;

#[async_trait]
impl ScenarioStep for TitleCheck {
    fn id(&self) -> StepId {
        StepId::Title
    }

    fn description(&self) -> &'static str {
        "page title names the product"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let title = probe.title().await?;
        let markers = &cx.config().title_markers;
        if markers.iter().any(|m| title.contains(m.as_str())) {
            cx.observe(format!("title '{title}'"));
        } else {
            let expected = markers.join("' or '");
            cx.finding(
                FindingKind::Structural,
                format!("title '{title}' does not contain '{expected}'"),
            );
        }
        Ok(())
    }
}

pub struct HeaderCheck;

#[async_trait]
impl ScenarioStep for HeaderCheck {
    fn id(&self) -> StepId {
        StepId::Header
    }

    fn description(&self) -> &'static str {
        "header heading is rendered"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let heading = probe.query(HEADER_HEADING).await?;
        if heading.is_empty() {
            cx.finding(FindingKind::Structural, format!("no `{HEADER_HEADING}` element"));
        } else {
            cx.observe(format!("header '{}'", excerpt(heading.text(), 60)));
        }
        Ok(())
    }
}

/// What a calendar without month blocks is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyCalendar {
    /// The app says there are no flights
    NoFlights,
    /// The app reports a failed load
    LoadFailed,
    /// Neither message is present
    Unrecognized,
}

/// Classifies the text of a calendar container with no month blocks.
#[must_use]
pub fn classify_empty_calendar(text: &str) -> EmptyCalendar {
    // A failure message wins over the empty message.
    if LOAD_FAILED_TEXTS.iter().any(|t| text.contains(t)) {
        EmptyCalendar::LoadFailed
    } else if text.contains(NO_FLIGHTS_TEXT) {
        EmptyCalendar::NoFlights
    } else {
        EmptyCalendar::Unrecognized
    }
}

pub struct CalendarPanel;

#[async_trait]
impl ScenarioStep for CalendarPanel {
    fn id(&self) -> StepId {
        StepId::CalendarPanel
    }

    fn description(&self) -> &'static str {
        "calendar renders months or a recognized empty or error message"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let wrap = probe.query(CALENDAR_WRAP).await?;
        if wrap.is_empty() {
            cx.finding(FindingKind::Structural, format!("no `{CALENDAR_WRAP}` container"));
            return Ok(());
        }

        let months = probe.query(MONTH).await?;
        if months.is_empty() {
            let text = wrap.text();
            match classify_empty_calendar(text) {
                EmptyCalendar::NoFlights => cx.observe("no flights to show (expected empty)"),
                EmptyCalendar::LoadFailed => cx.finding(
                    FindingKind::Data,
                    format!("calendar failed to load: '{}'", excerpt(text, 80)),
                ),
                EmptyCalendar::Unrecognized => {
                    let shown = match wrap.presence() {
                        Presence::PresentWithContent => format!("'{}'", excerpt(text, 80)),
                        _ => "nothing".to_string(),
                    };
                    cx.finding(
                        FindingKind::Content,
                        format!("calendar has no month blocks and shows {shown}"),
                    );
                }
            }
            return Ok(());
        }

        cx.observe(format!("{} month blocks", months.count()));
        if probe.query(TODAY).await?.is_empty() {
            cx.observe("no today cell in the rendered months");
        } else {
            cx.observe("today cell highlighted");
        }
        Ok(())
    }
}
