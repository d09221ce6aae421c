//! Core data types for dependency verdict reporting

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marker stored in place of a version or license the registry could not resolve
pub const UNKNOWN: &str = "Unknown";

/// Mapping from package name to the severity reported by the audit command
pub type VulnerabilityInfo = HashMap<String, String>;

/// A name/version pair as recorded in the project manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDeclaration {
    pub name: String,
    pub declared_version: String,
}

impl DependencyDeclaration {
    pub fn new(name: impl Into<String>, declared_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
        }
    }
}

/// Registry data for one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    /// Version the registry's "latest" tag points at, or [`UNKNOWN`]
    pub latest_version: String,
    /// License of the declared version, or [`UNKNOWN`]
    pub license: String,
}

impl PackageMetadata {
    /// Metadata with both fields unresolved
    pub fn unknown() -> Self {
        Self {
            latest_version: UNKNOWN.to_string(),
            license: UNKNOWN.to_string(),
        }
    }
}

/// Outcome of a best-effort registry lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataLookup {
    /// The registry answered and the declared version was found
    Resolved(PackageMetadata),
    /// Network failure, missing package, or missing version entry
    Unresolved,
}

impl MetadataLookup {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Collapse to metadata, substituting [`UNKNOWN`] for an unresolved lookup
    pub fn into_metadata(self) -> PackageMetadata {
        match self {
            Self::Resolved(metadata) => metadata,
            Self::Unresolved => PackageMetadata::unknown(),
        }
    }
}

/// Classification of a single declaration after cross-referencing external data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyVerdict {
    pub name: String,
    pub declared_version: String,
    pub latest_version: String,
    pub is_outdated: bool,
    pub vulnerability_severity: Option<String>,
    pub license: String,
    pub is_license_allowed: bool,
}

impl DependencyVerdict {
    pub fn is_vulnerable(&self) -> bool {
        self.vulnerability_severity.is_some()
    }
}

/// Summary counts over a set of verdicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total: usize,
    pub outdated: usize,
    pub vulnerable: usize,
    pub non_compliant: usize,
}

impl AuditSummary {
    /// Compute summary statistics from verdicts
    pub fn from_verdicts(verdicts: &[DependencyVerdict]) -> Self {
        let mut summary = Self {
            total: verdicts.len(),
            ..Self::default()
        };

        for verdict in verdicts {
            if verdict.is_outdated {
                summary.outdated += 1;
            }
            if verdict.is_vulnerable() {
                summary.vulnerable += 1;
            }
            if !verdict.is_license_allowed {
                summary.non_compliant += 1;
            }
        }

        summary
    }
}
