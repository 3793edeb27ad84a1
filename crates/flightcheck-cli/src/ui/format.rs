//! Formatting for durations, the run report and the step catalog.

use super::messages::paint;
use console::Term;
use flightcheck::{ReportGenerator, RunReport, ScenarioStep};
use owo_colors::Style;
use std::time::Duration;

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use flightcheck_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Split rendered report text into body and verdict line.
pub fn split_verdict(text: &str) -> (&str, &str) {
    match text.rsplit_once('\n') {
        Some((body, verdict)) => (body, verdict),
        None => ("", text),
    }
}

/// Print the report to stdout with the verdict line colored.
pub fn print_report(report: &RunReport, generator: &ReportGenerator) {
    let text = generator.render(report);
    let (body, verdict) = split_verdict(&text);
    let style = if report.passed() {
        Style::new().green().bold()
    } else {
        Style::new().red().bold()
    };
    println!("{body}");
    println!("{}", paint(verdict, style));
}

/// Print the step catalog to stdout, one step per line.
pub fn print_step_catalog(steps: &[Box<dyn ScenarioStep>]) {
    let width = match Term::stdout().size_checked() {
        Some((_, cols)) => usize::from(cols),
        None => 100,
    };
    for line in catalog_lines(steps, width) {
        println!("{line}");
    }
}

fn catalog_lines(steps: &[Box<dyn ScenarioStep>], width: usize) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let id = step.id();
            let prefix = format!("{:>2}. {:<17} ", i + 1, id.as_str());
            let room = width.saturating_sub(console::measure_text_width(&prefix));
            let description = console::truncate_str(step.description(), room.max(10), "…");
            format!("{}{}", paint(&prefix, Style::new().bold()), description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.34s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_split_verdict() {
        let (body, verdict) = split_verdict("Target: x\n\nPASS: 11 steps, no findings (4.2s)");
        assert_eq!(body, "Target: x\n");
        assert_eq!(verdict, "PASS: 11 steps, no findings (4.2s)");
        assert_eq!(split_verdict("FAIL"), ("", "FAIL"));
    }

    #[test]
    #[serial]
    fn test_catalog_lines_follow_step_order() {
        crate::ui::init_colors(true);
        let lines = catalog_lines(&flightcheck::steps::catalog(), 120);

        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with(" 1. title"));
        assert!(lines[10].starts_with("11. service-worker"));
    }

    #[test]
    #[serial]
    fn test_catalog_lines_truncate_to_width() {
        crate::ui::init_colors(true);
        let lines = catalog_lines(&flightcheck::steps::catalog(), 40);
        assert!(lines.iter().all(|l| console::measure_text_width(l) <= 40));
    }
}
