//! Registry of screenshots taken during a run.

use crate::error::Result;
use crate::probe::PageProbe;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A captured full-page screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screenshot {
    /// Checkpoint name, unique within a run
    pub name: String,
    /// File the PNG was written to
    pub path: PathBuf,
    /// 1-based capture order
    pub ordinal: usize,
}

/// Names screenshot files and records captures in order.
#[derive(Debug)]
pub struct ScreenshotRegistry {
    dir: PathBuf,
    prefix: String,
    shots: Vec<Screenshot>,
}

impl ScreenshotRegistry {
    /// Screenshots go to `dir/<prefix><name>.png`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            shots: Vec::new(),
        }
    }

    /// File path a checkpoint will be written to.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}.png", self.prefix, name))
    }

    /// Returns true if `name` was already captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.shots.iter().any(|s| s.name == name)
    }

    /// Records a capture.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. Checkpoint names are fixed in
    /// code, so a collision is a bug in the step library.
    pub fn register(&mut self, name: &str, path: &Path) -> &Screenshot {
        assert!(
            !self.contains(name),
            "screenshot name '{name}' registered twice"
        );
        self.shots.push(Screenshot {
            name: name.to_string(),
            path: path.to_path_buf(),
            ordinal: self.shots.len() + 1,
        });
        &self.shots[self.shots.len() - 1]
    }

    /// Takes a full-page screenshot through `probe` and records it.
    ///
    /// # Panics
    ///
    /// Panics before touching the page if `name` was already captured.
    pub async fn capture(&mut self, probe: &dyn PageProbe, name: &str) -> Result<&Screenshot> {
        assert!(
            !self.contains(name),
            "screenshot name '{name}' registered twice"
        );
        let path = self.path_for(name);
        probe.screenshot(&path).await?;
        tracing::debug!("Screenshot {} written to {}", name, path.display());
        Ok(self.register(name, &path))
    }

    /// Captures in order.
    #[must_use]
    pub fn shots(&self) -> &[Screenshot] {
        &self.shots
    }

    /// Consumes the registry.
    #[must_use]
    pub fn into_shots(self) -> Vec<Screenshot> {
        self.shots
    }
}
