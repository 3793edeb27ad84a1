//! Plain-text rendering of a [`RunReport`].

use crate::runner::{RunReport, StepOutcome};
use std::fmt::Write;

/// Renders run reports for the terminal.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    /// Most console problems listed before the rest are summarized
    pub console_limit: usize,
    /// Include informational observations
    pub observations: bool,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            console_limit: 20,
            observations: true,
        }
    }
}

impl ReportGenerator {
    /// Renders the full report. The verdict is the last line.
    #[must_use]
    pub fn render(&self, report: &RunReport) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_report(&mut out, report);
        out
    }

    fn write_report(&self, out: &mut String, report: &RunReport) -> std::fmt::Result {
        writeln!(out, "Target: {}", report.target_url)?;
        let phases: Vec<_> = report.phases.iter().map(ToString::to_string).collect();
        writeln!(out, "Phases: {}", phases.join(" → "))?;

        writeln!(out, "\nSteps ({}):", report.steps.len())?;
        for (i, step) in report.steps.iter().enumerate() {
            let status = match &step.outcome {
                StepOutcome::Completed => "completed".to_string(),
                StepOutcome::Aborted(reason) => format!("aborted: {reason}"),
                StepOutcome::Panicked(reason) => format!("panicked: {reason}"),
            };
            writeln!(
                out,
                "  {:>2}. {:<17} {:>6}ms  {}",
                i + 1,
                step.id.as_str(),
                step.duration.as_millis(),
                status
            )?;
        }

        writeln!(out, "\nFindings ({}):", report.findings.len())?;
        if report.findings.is_empty() {
            writeln!(out, "  none")?;
        }
        for finding in &report.findings {
            writeln!(out, "  {finding}")?;
        }

        if self.observations && !report.observations.is_empty() {
            writeln!(out, "\nObservations:")?;
            for obs in &report.observations {
                writeln!(out, "  {}: {}", obs.origin, obs.message)?;
            }
        }

        let console = &report.console;
        write!(
            out,
            "\nConsole: {} entries, {} errors, {} warnings",
            console.len(),
            console.error_count(),
            console.warning_or_error_count() - console.error_count()
        )?;
        if console.dropped() > 0 {
            write!(out, ", {} dropped", console.dropped())?;
        }
        writeln!(out)?;
        let problems: Vec<_> = console.problems().collect();
        for entry in problems.iter().take(self.console_limit) {
            writeln!(out, "  {entry}")?;
        }
        if problems.len() > self.console_limit {
            writeln!(out, "  ... {} more", problems.len() - self.console_limit)?;
        }

        writeln!(out, "\nScreenshots ({}):", report.screenshots.len())?;
        for shot in &report.screenshots {
            writeln!(out, "  {}. {} → {}", shot.ordinal, shot.name, shot.path.display())?;
        }

        writeln!(out)?;
        write!(out, "{}", verdict(report))
    }
}

/// One-line PASS/FAIL summary.
#[must_use]
pub fn verdict(report: &RunReport) -> String {
    if report.passed() {
        format!(
            "PASS: {} steps, no findings ({:.1}s)",
            report.steps.len(),
            report.duration.as_secs_f64()
        )
    } else {
        format!(
            "FAIL: {} finding(s) across {} steps ({:.1}s)",
            report.findings.len(),
            report.steps.len(),
            report.duration.as_secs_f64()
        )
    }
}
