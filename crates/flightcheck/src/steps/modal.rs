//! Flight detail modal: opening from an event cell and both ways of closing.

use super::selectors::{EVENT, MODAL, MODAL_BODY, MODAL_CLOSE};
use super::{ScenarioStep, StepContext, StepId, excerpt};
use crate::error::Result;
use crate::findings::FindingKind;
use crate::probe::PageProbe;
use async_trait::async_trait;

/// Viewport point outside the modal card, over the backdrop.
const OUTSIDE_POINT: (f64, f64) = (10.0, 10.0);

pub struct ModalOpenClose;

impl ModalOpenClose {
    async fn modal_visible(probe: &dyn PageProbe) -> Result<bool> {
        Ok(probe.query(MODAL).await?.is_visible())
    }
}

#[async_trait]
impl ScenarioStep for ModalOpenClose {
    fn id(&self) -> StepId {
        StepId::Modal
    }

    fn description(&self) -> &'static str {
        "event cell opens the detail modal; close button and backdrop both dismiss it"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let timings = cx.config().timings.clone();

        if probe.query(EVENT).await?.is_empty() {
            cx.observe("no event cells to open");
            return Ok(());
        }

        probe.click(EVENT, 0).await?;
        cx.settle(probe, timings.modal_open_settle_ms).await;
        if !Self::modal_visible(probe).await? {
            cx.finding(FindingKind::State, "modal did not open after clicking an event cell");
            return Ok(());
        }
        let body = probe.query(MODAL_BODY).await?;
        cx.observe(format!("modal shows '{}'", excerpt(body.text(), 80)));
        cx.screenshot(probe, "04_modal_open").await?;

        probe.click(MODAL_CLOSE, 0).await?;
        cx.settle(probe, timings.modal_close_settle_ms).await;
        if Self::modal_visible(probe).await? {
            cx.finding(FindingKind::State, "close button did not hide the modal");
        }

        // The backdrop check needs an open modal. Reopen only if the close
        // button actually closed it.
        if !Self::modal_visible(probe).await? {
            probe.click(EVENT, 0).await?;
            cx.settle(probe, timings.modal_close_settle_ms).await;
        }
        if !Self::modal_visible(probe).await? {
            cx.finding(
                FindingKind::State,
                "modal did not reopen for the outside-click check",
            );
            return Ok(());
        }

        probe.click_at(OUTSIDE_POINT.0, OUTSIDE_POINT.1).await?;
        cx.settle(probe, timings.modal_close_settle_ms).await;
        if Self::modal_visible(probe).await? {
            cx.finding(FindingKind::State, "clicking outside did not hide the modal");
        }
        Ok(())
    }
}
