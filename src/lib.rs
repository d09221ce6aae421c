//! # npm_dependency_audit
//!
//! Audits the dependencies declared in an npm project's `package.json`:
//! - **Outdated versions**: compares each declared version with the registry's `latest` tag
//! - **Known vulnerabilities**: cross-references the output of `npm audit --json`
//! - **License compliance**: checks the declared version's license against an allow-list
//!
//! ## Quick Start
//!
//! ```no_run
//! use npm_dependency_audit::{scan_project, AuditConfig, NetworkConfig, NpmAuditSource};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let project = Path::new(".");
//! let audit = NpmAuditSource::new(project);
//! let verdicts = scan_project(project, &AuditConfig::default(), &NetworkConfig::default(), &audit).await?;
//!
//! for verdict in verdicts {
//!     println!("{}: {} -> {}", verdict.name, verdict.declared_version, verdict.latest_version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! External lookups are best-effort: an unreachable registry yields `"Unknown"`
//! fields and a broken audit tool yields no vulnerabilities, so one failure
//! never prevents a report for the remaining dependencies.

mod audit;
mod classifier;
mod config;
mod error;
mod manifest;
mod metadata;
mod presenter;
mod report;
mod store;
mod types;
mod vulnerabilities;

// Re-export public API
pub use audit::{scan_project, scan_with};
pub use classifier::{build_verdict, classify};
pub use config::{AuditConfig, ConfigStore, NetworkConfig, CONFIG_FILE};
pub use error::{AuditError, Result};
pub use manifest::{merge_declarations, parse_declarations, project_name, read_manifest, MANIFEST_FILE};
pub use metadata::{MetadataFetcher, NpmRegistryClient};
pub use presenter::{render_detail, render_licenses, render_markdown, render_outdated, render_summary};
pub use report::{ReportStore, REPORT_FILE};
pub use store::STATE_DIR;
pub use types::{
    AuditSummary, DependencyDeclaration, DependencyVerdict, MetadataLookup, PackageMetadata, VulnerabilityInfo,
    UNKNOWN,
};
pub use vulnerabilities::{parse_audit_output, NoAudit, NpmAuditSource, VulnerabilitySource};
