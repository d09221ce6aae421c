//! Per-dependency verdicts from declarations, registry metadata and audit data

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::manifest::merge_declarations;
use crate::metadata::MetadataFetcher;
use crate::types::{DependencyDeclaration, DependencyVerdict, PackageMetadata, VulnerabilityInfo, UNKNOWN};
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Classify declarations in order, skipping ignored packages.
///
/// At most `concurrency` registry fetches are in flight; verdicts come back in
/// declaration order regardless of completion order. Each fetch is attempted
/// once and an unresolved lookup degrades to [`UNKNOWN`].
pub async fn classify(
    declarations: &[DependencyDeclaration],
    config: &AuditConfig,
    vulnerabilities: &VulnerabilityInfo,
    fetcher: &dyn MetadataFetcher,
    concurrency: usize,
) -> Result<Vec<DependencyVerdict>> {
    validate(declarations)?;

    let pending: Vec<DependencyDeclaration> = merge_declarations(declarations.iter().cloned())
        .into_iter()
        .filter(|declaration| {
            let ignored = config.is_ignored(&declaration.name);
            if ignored {
                debug!("Skipping ignored dependency: {}", declaration.name);
            }
            !ignored
        })
        .collect();

    let verdicts: Vec<DependencyVerdict> = stream::iter(pending)
        .map(|declaration| async move {
            let metadata = fetcher
                .fetch(&declaration.name, &declaration.declared_version)
                .await
                .into_metadata();
            build_verdict(declaration, metadata, config, vulnerabilities)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    Ok(verdicts)
}

/// Apply the outdated, vulnerability and license rules to one declaration
pub fn build_verdict(
    declaration: DependencyDeclaration,
    metadata: PackageMetadata,
    config: &AuditConfig,
    vulnerabilities: &VulnerabilityInfo,
) -> DependencyVerdict {
    let is_outdated =
        metadata.latest_version != declaration.declared_version && metadata.latest_version != UNKNOWN;
    let is_license_allowed = config.is_license_allowed(&metadata.license);
    let vulnerability_severity = vulnerabilities.get(&declaration.name).cloned();

    DependencyVerdict {
        name: declaration.name,
        declared_version: declaration.declared_version,
        latest_version: metadata.latest_version,
        is_outdated,
        vulnerability_severity,
        license: metadata.license,
        is_license_allowed,
    }
}

fn validate(declarations: &[DependencyDeclaration]) -> Result<()> {
    for (index, declaration) in declarations.iter().enumerate() {
        if declaration.name.trim().is_empty() {
            return Err(AuditError::invalid_input(format!(
                "declaration at index {} has an empty name",
                index
            )));
        }
        if declaration.declared_version.trim().is_empty() {
            return Err(AuditError::invalid_input(format!(
                "declaration \"{}\" has an empty version",
                declaration.name
            )));
        }
    }
    Ok(())
}
