//! Header controls: the refresh button and the upcoming-count badge.

use super::selectors::{BADGE, BADGE_COUNT_ATTR, REFRESH, REFRESH_BUSY_CLASS};
use super::{ScenarioStep, StepContext, StepId};
use crate::error::{ProbeError, Result};
use crate::findings::FindingKind;
use crate::probe::PageProbe;
use crate::wait::wait_for_result;
use async_trait::async_trait;

pub struct RefreshControl;

#[async_trait]
impl ScenarioStep for RefreshControl {
    fn id(&self) -> StepId {
        StepId::RefreshControl
    }

    fn description(&self) -> &'static str {
        "refresh button turns busy when clicked"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let button = probe.query(REFRESH).await?;
        let Some(state) = button.first() else {
            cx.finding(FindingKind::Structural, format!("no `{REFRESH}` control"));
            return Ok(());
        };
        if state.disabled {
            cx.observe("refresh disabled while a load is in progress; not clicked");
            return Ok(());
        }

        probe.click(REFRESH, 0).await?;
        let timings = cx.config().timings.clone();
        let busy = wait_for_result(
            move || async move {
                let button = probe.query(REFRESH).await?;
                Ok::<_, ProbeError>(
                    button.first().is_some_and(|b| b.has_class(REFRESH_BUSY_CLASS)),
                )
            },
            timings.refresh_busy(),
            "refresh button busy",
        )
        .await;

        match busy {
            Ok(()) => cx.observe("refresh button turned busy"),
            Err(ProbeError::WaitTimeout { timeout, .. }) => cx.finding(
                FindingKind::State,
                format!(
                    "refresh button did not gain `{REFRESH_BUSY_CLASS}` within {}ms",
                    timeout.as_millis()
                ),
            ),
            Err(e) => return Err(e),
        }

        // Let the reload finish before later steps look at the page.
        cx.settle(probe, timings.refresh_settle_ms).await;
        Ok(())
    }
}

pub struct BadgeCount;

#[async_trait]
impl ScenarioStep for BadgeCount {
    fn id(&self) -> StepId {
        StepId::BadgeCount
    }

    fn description(&self) -> &'static str {
        "upcoming badge count agrees with its text and visibility"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let badge = probe.query(BADGE).await?;
        let Some(info) = badge.first() else {
            cx.finding(FindingKind::Structural, format!("no `{BADGE}` element"));
            return Ok(());
        };

        let Some(raw) = info.attribute(BADGE_COUNT_ATTR) else {
            cx.finding(
                FindingKind::Content,
                format!("badge has no `{BADGE_COUNT_ATTR}` attribute"),
            );
            return Ok(());
        };
        let count: u32 = match raw.trim().parse() {
            Ok(count) => count,
            Err(_) => {
                cx.finding(
                    FindingKind::Content,
                    format!("badge `{BADGE_COUNT_ATTR}` '{raw}' is not a count"),
                );
                return Ok(());
            }
        };

        let text = info.text.trim();
        if count == 0 {
            if info.is_suppressed() {
                cx.observe("badge hidden at zero upcoming flights");
            } else {
                cx.finding(
                    FindingKind::Content,
                    format!("badge visible with zero upcoming flights (shows '{text}')"),
                );
            }
        } else if info.is_suppressed() {
            cx.finding(
                FindingKind::Content,
                format!("badge hidden despite {count} upcoming flights"),
            );
        } else if text != count.to_string() {
            cx.finding(
                FindingKind::Content,
                format!("badge shows '{text}' but `{BADGE_COUNT_ATTR}` is {count}"),
            );
        } else {
            cx.observe(format!("badge shows {count} upcoming"));
        }
        Ok(())
    }
}
