//! Vulnerability data from the local `npm audit` command

use crate::error::{AuditError, Result};
use crate::types::VulnerabilityInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Source of the package name to severity mapping for a project.
///
/// Implementations never fail: any problem yields an empty mapping.
#[async_trait]
pub trait VulnerabilitySource: Send + Sync {
    async fn fetch_all(&self) -> VulnerabilityInfo;
}

/// Runs `npm audit --json` in the project directory
pub struct NpmAuditSource {
    project_dir: PathBuf,
    program: String,
}

impl NpmAuditSource {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            program: "npm".to_string(),
        }
    }

    /// Use a different executable in place of `npm`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn run(&self) -> Result<VulnerabilityInfo> {
        debug!("Running {} audit --json in {}", self.program, self.project_dir.display());

        let output = Command::new(&self.program)
            .args(["audit", "--json"])
            .current_dir(&self.project_dir)
            .output()
            .await?;

        // npm exits non-zero when it finds vulnerabilities, so stdout decides
        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_audit_output(&stdout) {
            Ok(vulnerabilities) => Ok(vulnerabilities),
            Err(e) if !output.status.success() => Err(AuditError::api(
                "npm audit",
                format!("exited with {} and unparseable output: {}", output.status, e),
            )),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl VulnerabilitySource for NpmAuditSource {
    async fn fetch_all(&self) -> VulnerabilityInfo {
        match self.run().await {
            Ok(vulnerabilities) => {
                info!("Audit reported {} vulnerable packages", vulnerabilities.len());
                vulnerabilities
            }
            Err(e) => {
                warn!("Vulnerability audit unavailable, continuing without it: {}", e);
                VulnerabilityInfo::new()
            }
        }
    }
}

/// Source that reports no vulnerabilities, for scans that skip the audit
pub struct NoAudit;

#[async_trait]
impl VulnerabilitySource for NoAudit {
    async fn fetch_all(&self) -> VulnerabilityInfo {
        VulnerabilityInfo::new()
    }
}

#[derive(Debug, Deserialize)]
struct AuditDocument {
    /// npm 7 and later
    vulnerabilities: Option<HashMap<String, VulnerabilityEntry>>,
    /// npm 6
    advisories: Option<HashMap<String, Advisory>>,
}

#[derive(Debug, Deserialize)]
struct VulnerabilityEntry {
    severity: String,
}

#[derive(Debug, Deserialize)]
struct Advisory {
    module_name: String,
    severity: String,
}

/// Parse `npm audit --json` output into a name to severity mapping
pub fn parse_audit_output(output: &str) -> Result<VulnerabilityInfo> {
    let document: AuditDocument = serde_json::from_str(output)?;

    if let Some(vulnerabilities) = document.vulnerabilities {
        return Ok(vulnerabilities
            .into_iter()
            .map(|(name, entry)| (name, entry.severity))
            .collect());
    }

    let mut mapping = VulnerabilityInfo::new();
    for advisory in document.advisories.into_iter().flat_map(HashMap::into_values) {
        let stronger = mapping
            .get(&advisory.module_name)
            .map_or(true, |current| severity_rank(&advisory.severity) > severity_rank(current));
        if stronger {
            mapping.insert(advisory.module_name, advisory.severity);
        }
    }
    Ok(mapping)
}

fn severity_rank(severity: &str) -> u8 {
    match severity {
        "critical" => 4,
        "high" => 3,
        "moderate" => 2,
        "low" => 1,
        _ => 0,
    }
}
