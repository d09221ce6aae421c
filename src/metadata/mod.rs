//! Registry metadata fetchers

pub mod npm;

pub use npm::NpmRegistryClient;

use crate::types::MetadataLookup;
use async_trait::async_trait;

/// Source of latest-version and license data for a declared dependency.
///
/// Implementations are best-effort: every failure is reported as
/// [`MetadataLookup::Unresolved`] rather than an error.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, name: &str, declared_version: &str) -> MetadataLookup;
}
