use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Number of ticks that did work, kept in `run_count.txt` under the run-log dir.
pub struct RunCounter {
    path: PathBuf,
}

impl RunCounter {
    pub fn new(runlog_dir: &Path) -> Self {
        Self {
            path: runlog_dir.join("run_count.txt"),
        }
    }

    /// Current count. A missing or unreadable file counts as zero.
    pub fn read(&self) -> u64 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn write(&self, count: u64) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        std::fs::write(&self.path, count.to_string())
            .with_context(|| format!("writing {}", self.path.display()))
    }

    /// Bump the count and return the new value.
    pub fn increment(&self) -> Result<u64> {
        let next = self.read() + 1;
        self.write(next)?;
        Ok(next)
    }
}
