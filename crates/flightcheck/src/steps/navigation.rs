//! Bottom navigation between the calendar, upcoming and departed panels.

use super::selectors::{
    CALENDAR_PANEL, DEPARTED_CARDS, DEPARTED_PANEL, NAV_CALENDAR, NAV_DEPARTED, NAV_ITEM,
    NAV_UPCOMING, NO_FLIGHTS_TEXT, UPCOMING_CARDS, UPCOMING_LIST, UPCOMING_PANEL,
};
use super::{ScenarioStep, StepContext, StepId};
use crate::error::Result;
use crate::findings::FindingKind;
use crate::probe::PageProbe;
use async_trait::async_trait;

/// Records a Structural finding and returns false unless the nav control at
/// `index` exists.
async fn nav_control_present(
    probe: &dyn PageProbe,
    cx: &mut StepContext<'_>,
    index: usize,
) -> Result<bool> {
    let count = probe.query(NAV_ITEM).await?.count();
    if count > index {
        return Ok(true);
    }
    cx.finding(
        FindingKind::Structural,
        format!(
            "expected at least {} `{NAV_ITEM}` controls, found {count}",
            index + 1
        ),
    );
    Ok(false)
}

pub struct NavUpcoming;

#[async_trait]
impl ScenarioStep for NavUpcoming {
    fn id(&self) -> StepId {
        StepId::NavUpcoming
    }

    fn description(&self) -> &'static str {
        "second nav control shows the upcoming panel"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        if !nav_control_present(probe, cx, NAV_UPCOMING).await? {
            return Ok(());
        }
        probe.click(NAV_ITEM, NAV_UPCOMING).await?;
        cx.settle(probe, cx.config().timings.panel_settle_ms).await;

        if probe.query(UPCOMING_PANEL).await?.is_visible() {
            let list = probe.query(UPCOMING_LIST).await?;
            let cards = probe.query(UPCOMING_CARDS).await?.count();
            if cards > 0 {
                cx.observe(format!("{cards} upcoming flight cards"));
            } else if list.text().contains(NO_FLIGHTS_TEXT) {
                cx.observe("no upcoming flights (expected empty)");
            } else {
                cx.finding(
                    FindingKind::Content,
                    "upcoming list shows neither flight cards nor the no-flights message",
                );
            }
        } else {
            cx.finding(
                FindingKind::State,
                "upcoming panel not visible after selecting its nav control",
            );
        }

        cx.screenshot(probe, "02_upcoming_panel").await
    }
}

pub struct NavDeparted;

#[async_trait]
impl ScenarioStep for NavDeparted {
    fn id(&self) -> StepId {
        StepId::NavDeparted
    }

    fn description(&self) -> &'static str {
        "third nav control shows the departed panel"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        if !nav_control_present(probe, cx, NAV_DEPARTED).await? {
            return Ok(());
        }
        probe.click(NAV_ITEM, NAV_DEPARTED).await?;
        cx.settle(probe, cx.config().timings.panel_settle_ms).await;

        if probe.query(DEPARTED_PANEL).await?.is_visible() {
            let cards = probe.query(DEPARTED_CARDS).await?.count();
            cx.observe(format!("{cards} departed flight cards"));
        } else {
            cx.finding(
                FindingKind::State,
                "departed panel not visible after selecting its nav control",
            );
        }

        cx.screenshot(probe, "03_departed_panel").await
    }
}

pub struct NavBack;

#[async_trait]
impl ScenarioStep for NavBack {
    fn id(&self) -> StepId {
        StepId::NavBack
    }

    fn description(&self) -> &'static str {
        "first nav control returns to the calendar"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        probe.click(NAV_ITEM, NAV_CALENDAR).await?;
        cx.settle(probe, cx.config().timings.back_settle_ms).await;

        if !probe.query(CALENDAR_PANEL).await?.is_visible() {
            cx.finding(
                FindingKind::State,
                "calendar panel not visible after returning to it",
            );
        }
        Ok(())
    }
}
