//! Run command implementation.

use crate::cli::RunArgs;
use crate::config;
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use flightcheck::{
    ChromeLauncher, FindingKind, HarnessConfig, ReportGenerator, RunReport, ScenarioRunner,
};

/// Execute the run command.
///
/// 1. Layer and validate the configuration
/// 2. Create the screenshot directory
/// 3. Run every scenario step in one browser session
/// 4. Print the report (text or JSON)
///
/// # Errors
///
/// Configuration and I/O problems, and [`CliError::ChecksFailed`] when the
/// run recorded findings.
pub async fn execute(args: RunArgs) -> Result<()> {
    let config = config::load_config(&args)?;
    config::validate(&config)?;

    prepare_screenshot_dir(&config).await?;

    if !config.headless && ui::is_ci() {
        ui::warning("Running a headed browser in CI; this usually needs a display server");
    }
    ui::info(&format!("Checking {}", config.base_url));

    let launcher = ChromeLauncher::new(config.browser_settings());
    let report = ScenarioRunner::new(config).run(&launcher).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let generator = ReportGenerator {
            observations: !args.no_observations,
            ..ReportGenerator::default()
        };
        ui::print_report(&report, &generator);
    }

    summarize(&report)
}

async fn prepare_screenshot_dir(config: &HarnessConfig) -> Result<()> {
    let dir = &config.screenshot_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .context(format!("Failed to create screenshot directory {}", dir.display()))
}

/// Status line on stderr and the exit decision.
fn summarize(report: &RunReport) -> Result<()> {
    if report.passed() {
        ui::success(&format!(
            "All {} checks passed in {}",
            report.steps.len(),
            ui::format_duration(report.duration)
        ));
        return Ok(());
    }

    if report.findings_of(FindingKind::Fatal).next().is_some() {
        ui::error("The run hit a fatal problem; later findings may be consequences of it");
    }
    Err(CliError::ChecksFailed {
        count: report.findings.len(),
    })
}
