//! Persistence of the latest scan's verdicts

use crate::error::Result;
use crate::store::{read_json, write_json, STATE_DIR};
use crate::types::DependencyVerdict;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the persisted report inside [`STATE_DIR`]
pub const REPORT_FILE: &str = "report.json";

/// Holds the one report per project; each save replaces the previous scan
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_dir: &Path) -> Self {
        Self::new(project_dir.join(STATE_DIR).join(REPORT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, verdicts: &[DependencyVerdict]) -> Result<()> {
        write_json(&self.path, verdicts)?;
        info!("Saved {} verdicts to {}", verdicts.len(), self.path.display());
        Ok(())
    }

    /// Persisted verdicts in scan order, or empty when absent or unreadable
    pub fn load(&self) -> Vec<DependencyVerdict> {
        read_json(&self.path).unwrap_or_default()
    }
}
