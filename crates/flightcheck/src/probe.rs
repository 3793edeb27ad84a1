//! The `PageProbe` capability: what a scenario step may do to the page.
//!
//! Queries and actions have different failure contracts. `query` snapshots
//! every element matching a selector and treats zero matches as a normal
//! answer; callers inspect the returned `ElementSet` before acting. `click`
//! has a precondition and fails with `ProbeError::ElementNotFound` when the
//! target is missing.

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Snapshot of one matched element at query time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementInfo {
    /// Rendered text (`innerText`)
    pub text: String,
    /// Non-empty box, not `display: none`, not `visibility: hidden`
    pub visible: bool,
    /// The element's `disabled` property
    pub disabled: bool,
    /// Computed opacity
    pub opacity: f64,
    /// Computed `display` value
    pub display: String,
    /// All attributes, by name
    pub attributes: BTreeMap<String, String>,
}

impl ElementInfo {
    /// Looks up an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns true if the `class` attribute contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Hidden outright or rendered fully transparent.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        !self.visible || self.opacity <= 0.0
    }
}

/// Three-way answer to "is there anything here?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// No element matched
    Absent,
    /// Matched, but every match renders blank text
    PresentEmpty,
    /// Matched with visible text content
    PresentWithContent,
}

/// Every element matching a selector, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSet {
    selector: String,
    elements: Vec<ElementInfo>,
}

impl ElementSet {
    /// Wraps a snapshot taken for `selector`.
    #[must_use]
    pub fn new(selector: impl Into<String>, elements: Vec<ElementInfo>) -> Self {
        Self {
            selector: selector.into(),
            elements,
        }
    }

    /// The selector this set was queried with.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Number of matches.
    #[must_use]
    pub fn count(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The first match.
    #[must_use]
    pub fn first(&self) -> Option<&ElementInfo> {
        self.elements.first()
    }

    /// The match at `index`.
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&ElementInfo> {
        self.elements.get(index)
    }

    /// All matches.
    pub fn iter(&self) -> impl Iterator<Item = &ElementInfo> {
        self.elements.iter()
    }

    /// Whether the first match is visible. False when nothing matched.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.first().is_some_and(|e| e.visible)
    }

    /// Text of the first match, empty when nothing matched.
    #[must_use]
    pub fn text(&self) -> &str {
        self.first().map_or("", |e| e.text.as_str())
    }

    /// Attribute of the first match.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.first().and_then(|e| e.attribute(name))
    }

    /// Classifies the set as absent, present-but-blank, or present with text.
    #[must_use]
    pub fn presence(&self) -> Presence {
        if self.elements.is_empty() {
            Presence::Absent
        } else if self.elements.iter().all(|e| e.text.trim().is_empty()) {
            Presence::PresentEmpty
        } else {
            Presence::PresentWithContent
        }
    }
}

/// Script returning the service-worker registration state as a string.
pub const SERVICE_WORKER_STATE_SCRIPT: &str = r"(async () => {
    if (!('serviceWorker' in navigator)) return 'not_supported';
    const reg = await navigator.serviceWorker.getRegistration();
    if (!reg) return 'not_registered';
    return reg.active ? 'active' : (reg.installing ? 'installing' : 'waiting');
})()";

/// Builds the script that reads one `localStorage` key.
///
/// The key is JSON-encoded so it cannot break out of the string literal.
///
/// # Errors
///
/// Returns an error only if the key cannot be serialized.
pub fn storage_read_script(key: &str) -> Result<String> {
    let escaped = serde_json::to_string(key)?;
    Ok(format!("localStorage.getItem({escaped})"))
}

/// Browser-driver operations available to scenario steps.
///
/// Implemented by [`crate::page::ChromeProbe`] for a real browser. Methods take
/// `&self`; a probe is shared by reference with one step at a time.
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// Loads `url` and waits for the document to finish loading.
    ///
    /// Fails only when navigation itself cannot complete, never because some
    /// piece of page content is missing.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the document title.
    async fn title(&self) -> Result<String>;

    /// Snapshots every element matching `selector`. Zero matches is `Ok`.
    async fn query(&self, selector: &str) -> Result<ElementSet>;

    /// Clicks the `index`-th element matching `selector`.
    ///
    /// Fails with `ElementNotFound` if there is no such element.
    async fn click(&self, selector: &str, index: usize) -> Result<()>;

    /// Clicks at a viewport coordinate, whatever is there.
    async fn click_at(&self, x: f64, y: f64) -> Result<()>;

    /// Evaluates a read-only introspection expression and returns its value.
    ///
    /// Promises are awaited. Scripts must not mutate application state.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Captures the full page as PNG and writes it to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Fixed pause to let asynchronous rendering settle.
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Reads a `localStorage` entry; `None` when the key is unset.
    async fn storage_item(&self, key: &str) -> Result<Option<String>> {
        let value = self.evaluate(&storage_read_script(key)?).await?;
        Ok(match value {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
    }
}
