//! Findings and observations recorded during a run.
//!
//! Findings are deviations; a run with none passes. Observations are
//! informational lines (counts, states, excerpts) that go into the report
//! but never change the verdict. Both are append-only and keep discovery
//! order.

use crate::steps::StepId;
use serde::Serialize;
use std::fmt;

/// Closed taxonomy of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// Session could not be established, or an action's required element was
    /// missing. Ends the current step.
    Fatal,
    /// An expected element is absent
    Structural,
    /// Text or a value is not what it should be
    Content,
    /// Persisted or evaluated data failed to parse or validate
    Data,
    /// An interaction did not produce the expected UI transition
    State,
    /// The host or browser lacks a capability
    Environment,
}

impl FindingKind {
    /// Lowercase label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::Fatal => "fatal",
            FindingKind::Structural => "structural",
            FindingKind::Content => "content",
            FindingKind::Data => "data",
            FindingKind::State => "state",
            FindingKind::Environment => "environment",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which part of the run produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Session setup, navigation or the readiness gate
    Setup,
    /// A scenario step
    Step(StepId),
    /// Final screenshot and teardown
    Finalize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Setup => f.write_str("setup"),
            Origin::Step(id) => write!(f, "{id}"),
            Origin::Finalize => f.write_str("finalize"),
        }
    }
}

/// One recorded deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Category
    pub kind: FindingKind,
    /// Where it was found
    pub origin: Origin,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.origin, self.message)
    }
}

/// One informational line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Where it was observed
    pub origin: Origin,
    /// What was observed
    pub message: String,
}

/// Append-only store of findings and observations.
#[derive(Debug, Default)]
pub struct FindingCollector {
    findings: Vec<Finding>,
    observations: Vec<Observation>,
}

impl FindingCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding.
    pub fn record(&mut self, kind: FindingKind, origin: Origin, message: impl Into<String>) {
        let finding = Finding {
            kind,
            origin,
            message: message.into(),
        };
        tracing::warn!("{}", finding);
        self.findings.push(finding);
    }

    /// Records an observation.
    pub fn observe(&mut self, origin: Origin, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}: {}", origin, message);
        self.observations.push(Observation { origin, message });
    }

    /// Findings in discovery order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Observations in discovery order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Returns true if nothing has been found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Consumes the collector.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Finding>, Vec<Observation>) {
        (self.findings, self.observations)
    }
}
