//! Persisted audit preferences and runtime network settings

use crate::error::{AuditError, Result};
use crate::store::{read_json, write_json, STATE_DIR};
use crate::types::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// File name of the persisted config inside [`STATE_DIR`]
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// User preferences consulted by the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    /// Packages that never produce a verdict
    #[serde(rename = "ignored")]
    pub ignored_packages: Vec<String>,
    /// Licenses considered compliant
    pub allowed_licenses: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ignored_packages: Vec::new(),
            allowed_licenses: ["MIT", "Apache-2.0", "BSD-2-Clause", "BSD-3-Clause"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AuditConfig {
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_packages.iter().any(|ignored| ignored == name)
    }

    /// An unresolved license is never a violation
    pub fn is_license_allowed(&self, license: &str) -> bool {
        license == UNKNOWN || self.allowed_licenses.iter().any(|allowed| allowed == license)
    }

    /// Add a package to the ignore list. Returns false if it was already present.
    pub fn ignore(&mut self, name: impl Into<String>) -> bool {
        push_unique(&mut self.ignored_packages, name.into())
    }

    /// Add a license to the allow list. Returns false if it was already present.
    pub fn allow_license(&mut self, license: impl Into<String>) -> bool {
        push_unique(&mut self.allowed_licenses, license.into())
    }
}

fn push_unique(values: &mut Vec<String>, value: String) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

/// Loads and saves [`AuditConfig`] at a fixed project-relative path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at `<project_dir>/.dep-audit/config.json`
    pub fn for_project(project_dir: &Path) -> Self {
        Self::new(project_dir.join(STATE_DIR).join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted config, or the default when absent or corrupt
    pub fn load(&self) -> AuditConfig {
        read_json(&self.path).unwrap_or_default()
    }

    /// Overwrite the persisted config
    pub fn save(&self, config: &AuditConfig) -> Result<()> {
        write_json(&self.path, config)?;
        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    /// Load, apply the given additions, save, and return the new config.
    ///
    /// With neither addition this rewrites the current config unchanged.
    pub fn update(&self, ignore: Option<&str>, allow_license: Option<&str>) -> Result<AuditConfig> {
        let mut config = self.load();

        if let Some(name) = ignore {
            config.ignore(name);
        }
        if let Some(license) = allow_license {
            config.allow_license(license);
        }

        self.save(&config)?;
        Ok(config)
    }
}

/// Network configuration for registry calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Registry base URL, without trailing slash
    pub registry_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of registry requests in flight
    pub concurrency: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            registry_url: std::env::var("NPM_CONFIG_REGISTRY")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REGISTRY.to_string()),
            timeout_secs: 30,
            concurrency: 8,
        }
    }
}

impl NetworkConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Registry URL with any trailing slashes removed
    pub fn registry_base(&self) -> &str {
        self.registry_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(AuditError::config("concurrency must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(AuditError::config("timeout must be at least 1 second"));
        }
        if !self.registry_url.starts_with("http://") && !self.registry_url.starts_with("https://") {
            return Err(AuditError::config(format!(
                "registry URL must use http or https: {}",
                self.registry_url
            )));
        }
        Ok(())
    }
}
