//! Reader for `package.json` dependency declarations

use crate::error::{AuditError, Result};
use crate::types::DependencyDeclaration;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Manifest file name expected in the project root
pub const MANIFEST_FILE: &str = "package.json";

/// Declaration groups, merged in this order
const DEPENDENCY_GROUPS: [&str; 2] = ["dependencies", "devDependencies"];

/// Read the project manifest and return its merged declarations
pub fn read_manifest(project_dir: &Path) -> Result<Vec<DependencyDeclaration>> {
    let manifest = load_manifest(project_dir)?;
    parse_declarations(&manifest)
}

/// Name of the project, falling back to the directory name
pub fn project_name(project_dir: &Path) -> String {
    load_manifest(project_dir)
        .ok()
        .and_then(|manifest| manifest.get("name").and_then(Value::as_str).map(String::from))
        .or_else(|| {
            project_dir
                .canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "project".to_string())
}

fn load_manifest(project_dir: &Path) -> Result<Value> {
    let manifest_path = project_dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        return Err(AuditError::manifest(format!(
            "{} not found at {}",
            MANIFEST_FILE,
            manifest_path.display()
        )));
    }

    let content = fs::read_to_string(&manifest_path)?;
    serde_json::from_str(&content).map_err(|e| {
        AuditError::manifest(format!("{} is not valid JSON: {}", manifest_path.display(), e))
    })
}

/// Extract declarations from a parsed manifest document.
///
/// Groups merge like an object spread: a name keeps the position of its first
/// appearance and takes the version of its last.
pub fn parse_declarations(manifest: &Value) -> Result<Vec<DependencyDeclaration>> {
    let root = manifest
        .as_object()
        .ok_or_else(|| AuditError::invalid_input("manifest root must be a JSON object"))?;

    let mut groups = Vec::new();
    for group in DEPENDENCY_GROUPS {
        match root.get(group) {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => groups.push(read_group(group, entries)?),
            Some(_) => {
                return Err(AuditError::invalid_input(format!(
                    "\"{}\" must be an object of name/version pairs",
                    group
                )))
            }
        }
    }

    let declarations = merge_declarations(groups.into_iter().flatten());
    debug!("Read {} declarations from manifest", declarations.len());
    Ok(declarations)
}

fn read_group(group: &str, entries: &Map<String, Value>) -> Result<Vec<DependencyDeclaration>> {
    entries
        .iter()
        .map(|(name, version)| match version {
            Value::String(version) => Ok(DependencyDeclaration::new(name.clone(), version.clone())),
            other => Err(AuditError::invalid_input(format!(
                "\"{}\" entry \"{}\" must map to a version string, found {}",
                group, name, other
            ))),
        })
        .collect()
}

/// Merge declarations with last-write-wins semantics for repeated names
pub fn merge_declarations(
    declarations: impl IntoIterator<Item = DependencyDeclaration>,
) -> Vec<DependencyDeclaration> {
    let mut merged: Vec<DependencyDeclaration> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for declaration in declarations {
        match positions.get(&declaration.name) {
            Some(&index) => merged[index] = declaration,
            None => {
                positions.insert(declaration.name.clone(), merged.len());
                merged.push(declaration);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn names(declarations: &[DependencyDeclaration]) -> Vec<&str> {
        declarations.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_then_dev_dependencies() {
        let manifest: Value = serde_json::from_str(
            r#"{
                "name": "demo",
                "dependencies": {"zeta": "1.0.0", "alpha": "2.0.0"},
                "devDependencies": {"mocha": "10.0.0"}
            }"#,
        )
        .unwrap();

        let declarations = parse_declarations(&manifest).unwrap();
        assert_eq!(names(&declarations), vec!["zeta", "alpha", "mocha"]);
    }

    #[test]
    fn test_dev_group_overrides_version_in_place() {
        let manifest = json!({
            "dependencies": {"a": "1.0.0", "shared": "1.0.0", "b": "1.0.0"},
            "devDependencies": {"shared": "2.0.0", "c": "1.0.0"}
        });

        let declarations = parse_declarations(&manifest).unwrap();
        assert_eq!(names(&declarations), vec!["a", "shared", "b", "c"]);
        assert_eq!(declarations[1].declared_version, "2.0.0");
    }

    #[test]
    fn test_missing_groups_are_empty() {
        let declarations = parse_declarations(&json!({"name": "empty"})).unwrap();
        assert!(declarations.is_empty());
    }

    #[test]
    fn test_non_string_version_is_invalid() {
        let err = parse_declarations(&json!({"dependencies": {"lodash": 4}})).unwrap_err();
        assert!(matches!(err, AuditError::InvalidInput(_)));

        let err = parse_declarations(&json!({"devDependencies": ["lodash"]})).unwrap_err();
        assert!(matches!(err, AuditError::InvalidInput(_)));
    }

    #[test]
    fn test_read_manifest_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"name": "web-app", "dependencies": {"lodash": "4.17.0"}}"#,
        )
        .unwrap();

        let declarations = read_manifest(dir.path()).unwrap();
        assert_eq!(declarations, vec![DependencyDeclaration::new("lodash", "4.17.0")]);
        assert_eq!(project_name(dir.path()), "web-app");
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = read_manifest(dir.path()).unwrap_err();
        assert!(matches!(err, AuditError::ManifestError(_)));
    }
}
