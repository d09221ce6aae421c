//! JSON file helpers shared by the config and report stores

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Directory, relative to the project root, holding the config and report files
pub const STATE_DIR: &str = ".dep-audit";

/// Read and deserialize a JSON file.
///
/// Returns `None` when the file is missing or cannot be parsed. A missing file
/// is expected on first use and only logged at debug level.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet", path.display());
            return None;
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

/// Serialize a value as pretty JSON and overwrite `path`, creating parent directories
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("value.json");

        write_json(&path, &vec!["a", "b"]).unwrap();

        let back: Vec<String> = read_json(&path).unwrap();
        assert_eq!(back, vec!["a", "b"]);
    }

    #[test]
    fn test_read_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.json");
        assert!(read_json::<Vec<String>>(&path).is_none());

        fs::write(&path, "{ not json").unwrap();
        assert!(read_json::<Vec<String>>(&path).is_none());
    }
}
