//! Fetch metadata from the npm registry

use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::metadata::MetadataFetcher;
use crate::types::{MetadataLookup, PackageMetadata, UNKNOWN};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "npm registry";

/// Packument returned by `GET <registry>/<name>`
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    license: Option<Value>,
    #[serde(default)]
    licenses: Option<Vec<Value>>,
}

impl VersionInfo {
    /// License string, accepting the legacy `{ "type": ... }` and `licenses` forms
    fn license(&self) -> Option<String> {
        self.license
            .as_ref()
            .and_then(license_name)
            .or_else(|| self.licenses.as_ref()?.first().and_then(license_name))
    }
}

fn license_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(name) => name.as_str(),
        Value::Object(object) => object.get("type")?.as_str()?,
        _ => return None,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// HTTP client for the npm registry document API
pub struct NpmRegistryClient {
    client: Client,
    registry_url: String,
}

impl NpmRegistryClient {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = build_client(config)?;
        Ok(Self {
            client,
            registry_url: config.registry_base().to_string(),
        })
    }

    /// Fetch and resolve metadata, surfacing failures as errors
    async fn try_fetch(&self, name: &str, declared_version: &str) -> Result<MetadataLookup> {
        let url = package_url(&self.registry_url, name);
        debug!("Fetching registry metadata for {}@{} from {}", name, declared_version, url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AuditError::api(
                SERVICE,
                format!("HTTP {}: {}", response.status(), name),
            ));
        }

        let packument: Packument = response.json().await?;
        Ok(resolve(&packument, declared_version))
    }
}

#[async_trait]
impl MetadataFetcher for NpmRegistryClient {
    async fn fetch(&self, name: &str, declared_version: &str) -> MetadataLookup {
        match self.try_fetch(name, declared_version).await {
            Ok(lookup) => {
                if !lookup.is_resolved() {
                    debug!("{}@{} not found in registry versions", name, declared_version);
                }
                lookup
            }
            Err(e) => {
                warn!("Failed to fetch registry metadata for {}: {}", name, e);
                MetadataLookup::Unresolved
            }
        }
    }
}

/// Request URL for a package; scoped names keep `@` and encode the slash
fn package_url(registry_url: &str, name: &str) -> String {
    let encoded = match name.strip_prefix('@') {
        Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
        None => urlencoding::encode(name).into_owned(),
    };
    format!("{}/{}", registry_url, encoded)
}

/// Resolve the declared version's entry and the latest tag
fn resolve(packument: &Packument, declared_version: &str) -> MetadataLookup {
    let Some(version) = packument.versions.get(declared_version) else {
        return MetadataLookup::Unresolved;
    };

    MetadataLookup::Resolved(PackageMetadata {
        latest_version: packument
            .dist_tags
            .get("latest")
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        license: version.license().unwrap_or_else(|| UNKNOWN.to_string()),
    })
}

/// Build HTTP client with proper configuration
fn build_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .build()
        .map_err(|e| AuditError::network(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::build_verdict;
    use crate::config::AuditConfig;
    use crate::types::{DependencyDeclaration, VulnerabilityInfo};

    const LODASH: &str = r#"{
        "name": "lodash",
        "dist-tags": {"latest": "4.17.21"},
        "versions": {
            "4.17.0": {"version": "4.17.0", "license": "MIT"},
            "4.17.21": {"version": "4.17.21", "license": "MIT"}
        }
    }"#;

    fn network(url: &str) -> NetworkConfig {
        NetworkConfig {
            registry_url: url.to_string(),
            timeout_secs: 5,
            concurrency: 1,
        }
    }

    fn packument(json: &str) -> Packument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_package_url() {
        assert_eq!(
            package_url("https://registry.npmjs.org", "lodash"),
            "https://registry.npmjs.org/lodash"
        );
        assert_eq!(
            package_url("https://registry.npmjs.org", "@types/node"),
            "https://registry.npmjs.org/@types%2Fnode"
        );
    }

    #[test]
    fn test_resolve_uses_declared_version_license() {
        let doc = packument(
            r#"{
                "dist-tags": {"latest": "2.0.0"},
                "versions": {
                    "1.0.0": {"license": "GPL-3.0"},
                    "2.0.0": {"license": "MIT"}
                }
            }"#,
        );

        let metadata = resolve(&doc, "1.0.0").into_metadata();
        assert_eq!(metadata.latest_version, "2.0.0");
        assert_eq!(metadata.license, "GPL-3.0");
    }

    #[test]
    fn test_resolve_missing_version_is_unresolved() {
        assert_eq!(resolve(&packument(LODASH), "3.0.0"), MetadataLookup::Unresolved);
    }

    #[test]
    fn test_resolve_range_specifier_is_unresolved() {
        // Ranges are not version keys
        let lookup = resolve(&packument(LODASH), "^4.17.21");
        assert_eq!(lookup, MetadataLookup::Unresolved);

        let verdict = build_verdict(
            DependencyDeclaration::new("lodash", "^4.17.21"),
            lookup.into_metadata(),
            &AuditConfig::default(),
            &VulnerabilityInfo::new(),
        );
        assert_eq!(verdict.latest_version, UNKNOWN);
        assert!(!verdict.is_outdated);
        assert!(verdict.is_license_allowed);
    }

    #[test]
    fn test_legacy_license_forms() {
        let doc = packument(
            r#"{
                "dist-tags": {},
                "versions": {
                    "1.0.0": {"license": {"type": "BSD-3-Clause", "url": "http://example.com"}},
                    "1.1.0": {"licenses": [{"type": "Apache-2.0"}]},
                    "1.2.0": {}
                }
            }"#,
        );

        let old = resolve(&doc, "1.0.0").into_metadata();
        assert_eq!(old.license, "BSD-3-Clause");
        assert_eq!(old.latest_version, UNKNOWN);

        assert_eq!(resolve(&doc, "1.1.0").into_metadata().license, "Apache-2.0");
        assert_eq!(resolve(&doc, "1.2.0").into_metadata().license, UNKNOWN);
    }

    #[tokio::test]
    async fn test_fetch_from_registry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/lodash")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LODASH)
            .expect(1)
            .create_async()
            .await;

        let client = NpmRegistryClient::new(&network(&server.url())).unwrap();
        let lookup = client.fetch("lodash", "4.17.0").await;

        mock.assert_async().await;
        assert_eq!(
            lookup,
            MetadataLookup::Resolved(PackageMetadata {
                latest_version: "4.17.21".to_string(),
                license: "MIT".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_unresolved() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/left-pad")
            .with_status(404)
            .with_body(r#"{"error":"Not found"}"#)
            .create_async()
            .await;

        let client = NpmRegistryClient::new(&network(&server.url())).unwrap();
        assert_eq!(client.fetch("left-pad", "1.0.0").await, MetadataLookup::Unresolved);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_unresolved() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = NpmRegistryClient::new(&network(&server.url())).unwrap();
        assert_eq!(client.fetch("broken", "1.0.0").await, MetadataLookup::Unresolved);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_registry_is_unresolved() {
        let client = NpmRegistryClient::new(&network("http://127.0.0.1:9")).unwrap();
        assert_eq!(client.fetch("left-pad", "1.0.0").await, MetadataLookup::Unresolved);
    }
}
