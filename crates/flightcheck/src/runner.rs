//! The scenario runner.
//!
//! One run walks `Init → Loading → Ready|TimedOut → Executing → Finalizing
//! → Done`. Nothing a step does can skip a later phase: step errors and step
//! panics become Fatal findings, a readiness timeout is recorded and the
//! steps still run, and the final screenshot, session close and console
//! drain happen on every path that opened a session.

use crate::config::HarnessConfig;
use crate::error::ProbeError;
use crate::events::{ConsoleLog, EventSink};
use crate::findings::{Finding, FindingCollector, FindingKind, Observation, Origin};
use crate::probe::PageProbe;
use crate::screenshots::{Screenshot, ScreenshotRegistry};
use crate::session::SessionLauncher;
use crate::steps::{self, ScenarioStep, StepContext, StepId, selectors};
use crate::wait::wait_for_result;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Screenshot taken once the readiness gate resolves.
pub const INITIAL_SCREENSHOT: &str = "01_initial_load";
/// Screenshot taken unconditionally while finalizing.
pub const FINAL_SCREENSHOT: &str = "05_final_state";

/// Outcome of the page-ready gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadyState {
    /// No session, so no navigation was attempted
    Init,
    /// Navigation issued, gate not resolved
    Loading,
    /// A readiness marker appeared
    Ready,
    /// No marker within the bound, or navigation failed
    TimedOut,
}

/// Runner phase, recorded in the order entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    Init,
    Loading,
    Ready,
    TimedOut,
    Executing,
    Finalizing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunPhase::Init => "init",
            RunPhase::Loading => "loading",
            RunPhase::Ready => "ready",
            RunPhase::TimedOut => "timed-out",
            RunPhase::Executing => "executing",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
        })
    }
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "detail")]
pub enum StepOutcome {
    /// Ran to the end; it may still have recorded findings
    Completed,
    /// Stopped on a driver error
    Aborted(String),
    /// Panicked
    Panicked(String),
}

/// One executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub id: StepId,
    pub description: &'static str,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Page the run targeted
    pub target_url: String,
    /// Phases in the order entered
    pub phases: Vec<RunPhase>,
    /// Where the readiness gate ended up
    pub ready_state: ReadyState,
    /// Steps in execution order
    pub steps: Vec<StepRecord>,
    /// Deviations in discovery order
    pub findings: Vec<Finding>,
    /// Informational notes in discovery order
    pub observations: Vec<Observation>,
    /// Console output captured for the whole session
    pub console: ConsoleLog,
    /// Screenshots in capture order
    pub screenshots: Vec<Screenshot>,
    /// Wall-clock run time
    pub duration: Duration,
}

impl RunReport {
    /// A run passes when it recorded no findings.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings of one kind.
    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}

/// Mutable state threaded through one run.
struct RunState {
    phases: Vec<RunPhase>,
    ready_state: ReadyState,
    steps: Vec<StepRecord>,
    findings: FindingCollector,
    screenshots: ScreenshotRegistry,
}

impl RunState {
    fn enter(&mut self, phase: RunPhase) {
        debug!("Run phase: {}", phase);
        self.phases.push(phase);
    }
}

/// Runs the step catalog against one browser session.
pub struct ScenarioRunner {
    config: HarnessConfig,
    steps: Vec<Box<dyn ScenarioStep>>,
}

impl ScenarioRunner {
    /// Runner over the full step catalog.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            steps: steps::catalog(),
        }
    }

    /// Replaces the step list.
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<Box<dyn ScenarioStep>>) -> Self {
        self.steps = steps;
        self
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Box<dyn ScenarioStep>] {
        &self.steps
    }

    /// Executes one run. Never fails: every problem ends up in the report.
    pub async fn run(&self, launcher: &dyn SessionLauncher) -> RunReport {
        let started = Instant::now();
        let mut state = RunState {
            phases: vec![RunPhase::Init],
            ready_state: ReadyState::Init,
            steps: Vec::with_capacity(self.steps.len()),
            findings: FindingCollector::new(),
            screenshots: ScreenshotRegistry::new(
                &self.config.screenshot_dir,
                self.config.screenshot_prefix.clone(),
            ),
        };
        let (events, sink) = EventSink::bounded(self.config.console_capacity);

        info!("Opening browser session for {}", self.config.base_url);
        let console = match launcher.open(&self.config.session_context(), events).await {
            Ok(mut session) => {
                let probe = session.probe();
                self.load(probe, &mut state).await;
                self.capture(probe, &mut state, INITIAL_SCREENSHOT, Origin::Setup)
                    .await;

                state.enter(RunPhase::Executing);
                for step in &self.steps {
                    self.execute(step.as_ref(), probe, &mut state).await;
                }

                state.enter(RunPhase::Finalizing);
                self.capture(probe, &mut state, FINAL_SCREENSHOT, Origin::Finalize)
                    .await;
                if let Err(e) = session.close().await {
                    warn!("Closing the browser session failed: {}", e);
                }
                sink.drain()
            }
            Err(e) => {
                state.findings.record(
                    FindingKind::Fatal,
                    Origin::Setup,
                    format!("could not open a browser session: {e}"),
                );
                state.enter(RunPhase::Finalizing);
                sink.drain()
            }
        };
        state.enter(RunPhase::Done);

        let (findings, observations) = state.findings.into_parts();
        let report = RunReport {
            target_url: self.config.base_url.clone(),
            phases: state.phases,
            ready_state: state.ready_state,
            steps: state.steps,
            findings,
            observations,
            console,
            screenshots: state.screenshots.into_shots(),
            duration: started.elapsed(),
        };
        info!(
            "Run finished in {:?} with {} finding(s)",
            report.duration,
            report.findings.len()
        );
        report
    }

    /// Navigates and waits for a visible readiness marker.
    async fn load(&self, probe: &dyn PageProbe, state: &mut RunState) {
        state.enter(RunPhase::Loading);
        state.ready_state = ReadyState::Loading;

        if let Err(e) = probe.navigate(&self.config.base_url).await {
            state
                .findings
                .record(FindingKind::Fatal, Origin::Setup, e.to_string());
            state.ready_state = ReadyState::TimedOut;
            state.enter(RunPhase::TimedOut);
            return;
        }

        let ready = wait_for_result(
            move || async move {
                let markers = probe.query(selectors::READY).await?;
                Ok::<_, ProbeError>(markers.iter().any(|e| e.visible))
            },
            self.config.timings.readiness(),
            "first render",
        )
        .await;

        match ready {
            Ok(()) => {
                state.ready_state = ReadyState::Ready;
                state.enter(RunPhase::Ready);
            }
            Err(e) => {
                state.findings.record(
                    FindingKind::Fatal,
                    Origin::Setup,
                    format!("page never showed a readiness marker: {e}"),
                );
                state.ready_state = ReadyState::TimedOut;
                state.enter(RunPhase::TimedOut);
            }
        }
    }

    async fn execute(&self, step: &dyn ScenarioStep, probe: &dyn PageProbe, state: &mut RunState) {
        let id = step.id();
        info!("Step {}: {}", id, step.description());
        let started = Instant::now();

        let mut cx = StepContext::new(
            id,
            &self.config,
            &mut state.findings,
            &mut state.screenshots,
        );
        let result = AssertUnwindSafe(step.run(probe, &mut cx))
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(())) => StepOutcome::Completed,
            Ok(Err(e)) => {
                let message = e.to_string();
                state
                    .findings
                    .record(FindingKind::Fatal, Origin::Step(id), message.clone());
                StepOutcome::Aborted(message)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                state.findings.record(
                    FindingKind::Fatal,
                    Origin::Step(id),
                    format!("step panicked: {message}"),
                );
                StepOutcome::Panicked(message)
            }
        };

        state.steps.push(StepRecord {
            id,
            description: step.description(),
            outcome,
            duration: started.elapsed(),
        });
    }

    /// Takes a runner-owned checkpoint screenshot. Failure is Fatal for `origin`.
    async fn capture(
        &self,
        probe: &dyn PageProbe,
        state: &mut RunState,
        name: &str,
        origin: Origin,
    ) {
        if let Err(e) = state.screenshots.capture(probe, name).await {
            state.findings.record(FindingKind::Fatal, origin, e.to_string());
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::events::{ConsoleEntry, ConsoleLevel};
    use crate::fake::{FakeLauncher, FakePage, flight_app};
    use crate::steps::{CacheValidation, TitleCheck};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn config() -> HarnessConfig {
        HarnessConfig {
            screenshot_dir: PathBuf::from("/tmp/flightcheck-test"),
            timings: Timings::immediate(),
            ..HarnessConfig::default()
        }
    }

    #[tokio::test]
    async fn healthy_app_passes_every_step_in_order() {
        let page = Arc::new(flight_app());
        let launcher = FakeLauncher::new(page.clone());
        let runner = ScenarioRunner::new(config());

        let report = runner.run(&launcher).await;

        assert!(report.passed(), "{:#?}", report.findings);
        assert_eq!(report.ready_state, ReadyState::Ready);
        assert_eq!(
            report.phases,
            [
                RunPhase::Init,
                RunPhase::Loading,
                RunPhase::Ready,
                RunPhase::Executing,
                RunPhase::Finalizing,
                RunPhase::Done
            ]
        );
        let executed: Vec<_> = report.steps.iter().map(|s| s.id).collect();
        let declared: Vec<_> = runner.steps().iter().map(|s| s.id()).collect();
        assert_eq!(executed, declared);
        assert!(report.steps.iter().all(|s| s.outcome == StepOutcome::Completed));

        let shots: Vec<_> = report.screenshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            shots,
            [
                "01_initial_load",
                "02_upcoming_panel",
                "03_departed_panel",
                "04_modal_open",
                "05_final_state"
            ]
        );
        assert_eq!(
            page.screenshots().last(),
            Some(&PathBuf::from("/tmp/flightcheck-test/debug_05_final_state.png"))
        );
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn settle_delays_go_through_the_probe() {
        let page = Arc::new(flight_app());
        let launcher = FakeLauncher::new(page.clone());
        let config = HarnessConfig {
            screenshot_dir: PathBuf::from("/tmp/flightcheck-test"),
            ..HarnessConfig::default()
        };

        let report = ScenarioRunner::new(config).run(&launcher).await;

        assert!(report.passed(), "{:#?}", report.findings);
        // Two panel switches, back, modal open plus three closes, refresh.
        assert_eq!(page.waited(), Duration::from_millis(500 * 2 + 300 + 500 + 400 * 3 + 2000));
    }

    #[tokio::test]
    async fn order_is_independent_of_findings() {
        // Nothing renders: most steps record findings or abort.
        let page = Arc::new(FakePage::new().with_title("Blank"));
        let launcher = FakeLauncher::new(page);
        let runner = ScenarioRunner::new(config());

        let report = runner.run(&launcher).await;

        let executed: Vec<_> = report.steps.iter().map(|s| s.id).collect();
        let declared: Vec<_> = steps::catalog().iter().map(|s| s.id()).collect();
        assert_eq!(executed, declared);
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn readiness_timeout_still_finalizes() {
        let page = Arc::new(FakePage::new().with_title("飛行日曆"));
        let launcher = FakeLauncher::new(page.clone());

        let report = ScenarioRunner::new(config()).run(&launcher).await;

        assert_eq!(report.ready_state, ReadyState::TimedOut);
        assert_eq!(report.findings[0].kind, FindingKind::Fatal);
        assert_eq!(report.findings[0].origin, Origin::Setup);
        assert!(report.phases.contains(&RunPhase::TimedOut));
        assert_eq!(report.phases.last(), Some(&RunPhase::Done));
        assert_eq!(report.steps.len(), steps::catalog().len());
        assert_eq!(
            report.screenshots.last().map(|s| s.name.as_str()),
            Some(FINAL_SCREENSHOT)
        );
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn navigation_failure_is_fatal_but_steps_run() {
        let page = Arc::new(flight_app().failing_navigation());
        let launcher = FakeLauncher::new(page);

        let report = ScenarioRunner::new(config()).run(&launcher).await;

        assert_eq!(report.ready_state, ReadyState::TimedOut);
        assert!(report.findings[0].message.contains("ERR_CONNECTION_REFUSED"));
        assert_eq!(report.steps.len(), steps::catalog().len());
    }

    #[tokio::test]
    async fn session_open_failure_still_reports() {
        let launcher = FakeLauncher::new(Arc::new(FakePage::new())).failing();

        let report = ScenarioRunner::new(config()).run(&launcher).await;

        assert_eq!(report.ready_state, ReadyState::Init);
        assert_eq!(
            report.phases,
            [RunPhase::Init, RunPhase::Finalizing, RunPhase::Done]
        );
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::Fatal);
        assert!(report.steps.is_empty());
        assert!(report.screenshots.is_empty());
    }

    #[tokio::test]
    async fn panicking_step_is_contained() {
        let page = Arc::new(flight_app().panicking_title());
        let launcher = FakeLauncher::new(page);
        let runner = ScenarioRunner::new(config())
            .with_steps(vec![Box::new(TitleCheck), Box::new(CacheValidation)]);

        let report = runner.run(&launcher).await;

        assert!(matches!(report.steps[0].outcome, StepOutcome::Panicked(ref m) if m.contains("exploded")));
        assert_eq!(report.steps[1].outcome, StepOutcome::Completed);
        assert_eq!(report.findings_of(FindingKind::Fatal).count(), 1);
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn malformed_cache_does_not_stop_later_steps() {
        let page = Arc::new(flight_app().with_storage("flights_cache_v1", "not json"));
        let launcher = FakeLauncher::new(page);

        let report = ScenarioRunner::new(config()).run(&launcher).await;

        assert_eq!(report.findings.len(), 1, "{:#?}", report.findings);
        assert_eq!(report.findings[0].kind, FindingKind::Data);
        assert_eq!(report.findings[0].origin, Origin::Step(StepId::CacheValidation));
        assert_eq!(report.steps.len(), steps::catalog().len());
    }

    #[tokio::test]
    async fn screenshot_failures_are_fatal_findings() {
        let page = Arc::new(flight_app().failing_screenshots());
        let launcher = FakeLauncher::new(page);
        let runner = ScenarioRunner::new(config()).with_steps(vec![Box::new(TitleCheck)]);

        let report = runner.run(&launcher).await;

        let origins: Vec<_> = report.findings.iter().map(|f| f.origin).collect();
        assert_eq!(origins, [Origin::Setup, Origin::Finalize]);
        assert!(report.screenshots.is_empty());
    }

    #[tokio::test]
    async fn console_is_drained_after_close() {
        let page = Arc::new(flight_app());
        let launcher = FakeLauncher::new(page).with_console(vec![
            ConsoleEntry::new(ConsoleLevel::Info, "SW registered"),
            ConsoleEntry::page_error("TypeError: x is undefined"),
        ]);
        let runner = ScenarioRunner::new(config()).with_steps(vec![]);

        let report = runner.run(&launcher).await;

        assert_eq!(report.console.len(), 2);
        assert_eq!(report.console.error_count(), 1);
        assert!(report.passed());
    }

    /// Re-captures the runner's first checkpoint.
    struct ReusesInitialShot;

    #[async_trait::async_trait]
    impl ScenarioStep for ReusesInitialShot {
        fn id(&self) -> StepId {
            StepId::Header
        }

        fn description(&self) -> &'static str {
            "captures a checkpoint under a taken name"
        }

        async fn run(&self, probe: &dyn PageProbe, cx: &mut StepContext<'_>) -> crate::Result<()> {
            cx.screenshot(probe, INITIAL_SCREENSHOT).await
        }
    }

    #[tokio::test]
    async fn duplicate_screenshot_name_is_a_contained_panic() {
        let page = Arc::new(flight_app());
        let launcher = FakeLauncher::new(page);
        let mut plan = steps::catalog();
        plan.insert(1, Box::new(ReusesInitialShot));
        let total = plan.len();
        let runner = ScenarioRunner::new(config()).with_steps(plan);

        let report = runner.run(&launcher).await;

        assert!(
            matches!(report.steps[1].outcome, StepOutcome::Panicked(ref m) if m.contains("registered twice")),
            "{:#?}",
            report.steps[1]
        );
        let fatal: Vec<_> = report.findings_of(FindingKind::Fatal).collect();
        assert_eq!(fatal.len(), 1, "{:#?}", report.findings);
        assert_eq!(fatal[0].origin, Origin::Step(StepId::Header));
        assert_eq!(report.steps.len(), total);
        assert!(report.steps[2..].iter().all(|s| s.outcome == StepOutcome::Completed));
        let initial = report
            .screenshots
            .iter()
            .filter(|s| s.name == INITIAL_SCREENSHOT)
            .count();
        assert_eq!(initial, 1);
        assert_eq!(
            report.screenshots.last().map(|s| s.name.as_str()),
            Some(FINAL_SCREENSHOT)
        );
        assert_eq!(report.phases.last(), Some(&RunPhase::Done));
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn repeated_runs_report_the_same_findings() {
        async fn run_findings(page: FakePage) -> Vec<(FindingKind, Origin, String)> {
            let launcher = FakeLauncher::new(Arc::new(page));
            let report = ScenarioRunner::new(config()).run(&launcher).await;
            report
                .findings
                .into_iter()
                .map(|f| (f.kind, f.origin, f.message))
                .collect()
        }
        let broken = || {
            flight_app()
                .with(selectors::HEADER_HEADING, vec![])
                .with_storage("flights_cache_v1", "not json")
        };

        assert!(run_findings(flight_app()).await.is_empty());
        assert_eq!(run_findings(flight_app()).await, run_findings(flight_app()).await);

        let first = run_findings(broken()).await;
        let second = run_findings(broken()).await;
        assert_eq!(first, second);
        let kinds: Vec<_> = first.iter().map(|(kind, ..)| *kind).collect();
        assert!(kinds.contains(&FindingKind::Structural), "{first:#?}");
        assert!(kinds.contains(&FindingKind::Data), "{first:#?}");
    }

    #[tokio::test]
    async fn hidden_readiness_marker_does_not_open_the_gate() {
        let page = Arc::new(
            FakePage::new()
                .with_title("我的飛行日曆 Flight Calendar")
                .with(selectors::MONTH, vec![crate::fake::hidden("3月")]),
        );
        let launcher = FakeLauncher::new(page);

        let report = ScenarioRunner::new(config()).with_steps(vec![]).run(&launcher).await;

        assert_eq!(report.ready_state, ReadyState::TimedOut);
        assert!(report.phases.contains(&RunPhase::TimedOut));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::Fatal);
        assert_eq!(report.findings[0].origin, Origin::Setup);
    }

    #[tokio::test]
    async fn one_visible_readiness_marker_is_enough() {
        let page = Arc::new(
            FakePage::new()
                .with(selectors::MONTH, vec![crate::fake::hidden("2月"), crate::fake::el("3月")]),
        );
        let launcher = FakeLauncher::new(page);

        let report = ScenarioRunner::new(config()).with_steps(vec![]).run(&launcher).await;

        assert_eq!(report.ready_state, ReadyState::Ready);
        assert!(report.passed(), "{:#?}", report.findings);
    }

    #[test]
    fn panic_payloads_become_messages() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
