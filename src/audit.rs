//! Main audit orchestration logic

use crate::classifier::classify;
use crate::config::{AuditConfig, NetworkConfig};
use crate::error::Result;
use crate::manifest::read_manifest;
use crate::metadata::{MetadataFetcher, NpmRegistryClient};
use crate::types::{AuditSummary, DependencyVerdict};
use crate::vulnerabilities::VulnerabilitySource;
use std::path::Path;
use tracing::info;

/// Scan a project against the configured npm registry
pub async fn scan_project(
    project_path: &Path,
    config: &AuditConfig,
    network: &NetworkConfig,
    vulnerability_source: &dyn VulnerabilitySource,
) -> Result<Vec<DependencyVerdict>> {
    network.validate()?;
    let registry = NpmRegistryClient::new(network)?;
    scan_with(project_path, config, &registry, vulnerability_source, network.concurrency).await
}

/// Scan a project with explicit collaborators
pub async fn scan_with(
    project_path: &Path,
    config: &AuditConfig,
    fetcher: &dyn MetadataFetcher,
    vulnerability_source: &dyn VulnerabilitySource,
    concurrency: usize,
) -> Result<Vec<DependencyVerdict>> {
    info!("Starting audit of project at: {}", project_path.display());

    let declarations = read_manifest(project_path)?;
    info!("Found {} declared dependencies", declarations.len());

    let vulnerabilities = vulnerability_source.fetch_all().await;
    let verdicts = classify(&declarations, config, &vulnerabilities, fetcher, concurrency).await?;

    let summary = AuditSummary::from_verdicts(&verdicts);
    info!(
        "Audit complete: {} checked, {} outdated, {} vulnerable, {} non-compliant",
        summary.total, summary.outdated, summary.vulnerable, summary.non_compliant
    );

    Ok(verdicts)
}
