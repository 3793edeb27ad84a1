//! Background capture of console output and uncaught page errors.
//!
//! Listener tasks spawned by the session push `ConsoleEntry` values into a
//! bounded queue while steps run. Nothing reads the queue until the run is
//! finalizing, when `EventSink::drain` empties it into a `ConsoleLog` for the
//! report. Producers never block: if the queue is full the entry is dropped
//! and counted.

use chromiumoxide::cdp::js_protocol::runtime::{
    EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Severity of a captured entry.
///
/// `console.log`, `console.debug` and friends all collapse into `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// `console.error()` or an uncaught exception
    Error,
    /// `console.warn()`
    Warning,
    /// Everything else
    Info,
}

impl ConsoleLevel {
    /// Returns true if this is an error-level entry.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ConsoleLevel::Error)
    }

    /// Returns true if this is a warning or error.
    #[must_use]
    pub fn is_warning_or_error(&self) -> bool {
        matches!(self, ConsoleLevel::Warning | ConsoleLevel::Error)
    }
}

impl From<&EventConsoleApiCalled> for ConsoleLevel {
    fn from(event: &EventConsoleApiCalled) -> Self {
        use chromiumoxide::cdp::js_protocol::runtime::ConsoleApiCalledType;

        match event.r#type {
            ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => ConsoleLevel::Error,
            ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
            _ => ConsoleLevel::Info,
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsoleLevel::Error => "error",
            ConsoleLevel::Warning => "warning",
            ConsoleLevel::Info => "info",
        })
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryOrigin {
    /// A `console.*` API call
    Console,
    /// An uncaught exception thrown in the page
    PageError,
}

/// One captured console line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    /// Severity level
    pub level: ConsoleLevel,

    /// The formatted message text. Multiple arguments are joined with spaces.
    pub text: String,

    /// Console call or page exception
    pub origin: EntryOrigin,

    /// When the entry was captured (system time, not page time).
    pub timestamp: SystemTime,

    /// Source location if available (e.g., "app.js:42:10").
    pub source: Option<String>,
}

impl ConsoleEntry {
    /// Creates a console-origin entry.
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            origin: EntryOrigin::Console,
            timestamp: SystemTime::now(),
            source: None,
        }
    }

    /// Creates an error entry for an uncaught page exception.
    #[must_use]
    pub fn page_error(text: impl Into<String>) -> Self {
        Self {
            origin: EntryOrigin::PageError,
            ..Self::new(ConsoleLevel::Error, text)
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            EntryOrigin::Console => write!(f, "[{}] {}", self.level, self.text)?,
            EntryOrigin::PageError => write!(f, "[page error] {}", self.text)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

/// Producer half of the console queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ConsoleEntry>,
    dropped: Arc<AtomicUsize>,
}

impl EventSender {
    /// Appends an entry without waiting.
    ///
    /// A full queue drops the entry and bumps the drop counter. Entries sent
    /// after the sink has been drained are discarded silently.
    pub fn record(&self, entry: ConsoleEntry) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(entry) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Consumer half of the console queue, owned by the runner.
#[derive(Debug)]
pub struct EventSink {
    rx: mpsc::Receiver<ConsoleEntry>,
    dropped: Arc<AtomicUsize>,
}

impl EventSink {
    /// Creates a queue holding at most `capacity` entries (minimum one).
    #[must_use]
    pub fn bounded(capacity: usize) -> (EventSender, EventSink) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        (
            EventSender {
                tx,
                dropped: dropped.clone(),
            },
            EventSink { rx, dropped },
        )
    }

    /// Closes the queue and collects everything captured, in arrival order.
    #[must_use]
    pub fn drain(mut self) -> ConsoleLog {
        self.rx.close();
        let mut entries = Vec::new();
        while let Ok(entry) = self.rx.try_recv() {
            entries.push(entry);
        }
        ConsoleLog {
            entries,
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// The drained console log, ready for reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleLog {
    entries: Vec<ConsoleEntry>,
    dropped: usize,
}

impl ConsoleLog {
    /// All entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    /// Entries lost because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Entries with exactly the given level.
    pub fn with_level(&self, level: ConsoleLevel) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// Warning and error entries, in arrival order.
    pub fn problems(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter().filter(|e| e.level.is_warning_or_error())
    }

    /// Returns the count of error entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.level.is_error()).count()
    }

    /// Returns the count of warning or error entries.
    #[must_use]
    pub fn warning_or_error_count(&self) -> usize {
        self.problems().count()
    }

    /// Returns the total number of captured entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn format_remote_object(arg: &RemoteObject) -> String {
    match &arg.value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) => "null".to_string(),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => v.to_string(),
        _ => arg
            .description
            .clone()
            .unwrap_or_else(|| "<object>".to_string()),
    }
}

/// Converts a CDP `Runtime.consoleAPICalled` event into an entry.
pub(crate) fn parse_console_event(event: &EventConsoleApiCalled) -> ConsoleEntry {
    let text = event
        .args
        .iter()
        .map(format_remote_object)
        .collect::<Vec<_>>()
        .join(" ");

    let mut entry = ConsoleEntry::new(ConsoleLevel::from(event), text);

    if let Some(frame) = event
        .stack_trace
        .as_ref()
        .and_then(|trace| trace.call_frames.first())
    {
        entry = entry.with_source(format!(
            "{}:{}:{}",
            frame.url, frame.line_number, frame.column_number
        ));
    }

    entry
}

/// Converts a CDP `Runtime.exceptionThrown` event into a page-error entry.
pub(crate) fn parse_exception_event(event: &EventExceptionThrown) -> ConsoleEntry {
    let details = &event.exception_details;
    let text = details
        .exception
        .as_ref()
        .and_then(|e| e.description.clone())
        .unwrap_or_else(|| details.text.clone());

    let entry = ConsoleEntry::page_error(text);
    match &details.url {
        Some(url) => entry.with_source(format!(
            "{}:{}:{}",
            url, details.line_number, details.column_number
        )),
        None => entry,
    }
}
