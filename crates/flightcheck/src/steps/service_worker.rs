use super::{ScenarioStep, StepContext, StepId};
use crate::error::Result;
use crate::findings::FindingKind;
use crate::probe::{PageProbe, SERVICE_WORKER_STATE_SCRIPT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration state reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceWorkerState {
    NotSupported,
    NotRegistered,
    Installing,
    Waiting,
    Active,
}

impl fmt::Display for ServiceWorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceWorkerState::NotSupported => "not_supported",
            ServiceWorkerState::NotRegistered => "not_registered",
            ServiceWorkerState::Installing => "installing",
            ServiceWorkerState::Waiting => "waiting",
            ServiceWorkerState::Active => "active",
        })
    }
}

pub struct ServiceWorkerCheck;

#[async_trait]
impl ScenarioStep for ServiceWorkerCheck {
    fn id(&self) -> StepId {
        StepId::ServiceWorker
    }

    fn description(&self) -> &'static str {
        "service worker registration state"
    }

    async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> Result<()> {
        let value = probe.evaluate(SERVICE_WORKER_STATE_SCRIPT).await?;
        match serde_json::from_value::<ServiceWorkerState>(value.clone()) {
            Ok(ServiceWorkerState::NotSupported) => cx.finding(
                FindingKind::Environment,
                "browser does not support service workers",
            ),
            Ok(ServiceWorkerState::NotRegistered) => {
                cx.observe("service worker not registered yet (normal on first load)");
            }
            Ok(state) => cx.observe(format!("service worker {state}")),
            Err(_) => cx.finding(
                FindingKind::Data,
                format!("unrecognized service worker state {value}"),
            ),
        }
        Ok(())
    }
}
