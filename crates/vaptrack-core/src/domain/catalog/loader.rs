//! Catalog file loading
//!
//! Catalogs are JSON arrays of entries kept in a data directory; the file
//! name is chosen by the caller (different files carry different feature
//! collections).

use super::entry::CatalogEntry;
use crate::error::{Error, Result};
use std::path::Path;

/// Load a catalog file from the data directory
pub fn load_catalog(data_dir: &Path, file: &str) -> Result<Vec<CatalogEntry>> {
    // Strip any path components so callers cannot escape the data dir
    let file_name = Path::new(file)
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("invalid catalog file name: {}", file)))?;

    let path = data_dir.join(file_name);
    if !path.exists() {
        return Err(Error::CatalogNotFound(
            file_name.to_string_lossy().to_string(),
        ));
    }

    let contents = std::fs::read_to_string(&path)?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::CatalogParse(format!("{}: {}", path.display(), e)))
}

/// List the catalog files (JSON) available in the data directory, sorted
pub fn list_catalog_files(data_dir: &Path) -> Result<Vec<String>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for dir_entry in std::fs::read_dir(data_dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).expect("Failed to write catalog file");
    }

    #[test]
    fn test_load_catalog() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            &dir,
            "features.json",
            r#"[
                {"name": "XSS Protection", "category": "owasp-a3"},
                {"key": "csrf", "name": "CSRF Guard"}
            ]"#,
        );

        let entries = load_catalog(dir.path(), "features.json").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].resolved_key(), "xss-protection");
        assert_eq!(entries[1].resolved_key(), "csrf");
    }

    #[test]
    fn test_load_missing_catalog() {
        let dir = TempDir::new().unwrap();
        let err = load_catalog(dir.path(), "nope.json").unwrap_err();
        assert!(matches!(err, Error::CatalogNotFound(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "broken.json", "{not json");

        let err = load_catalog(dir.path(), "broken.json").unwrap_err();
        assert!(matches!(err, Error::CatalogParse(_)));
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "features.json", "[]");

        // Path components are stripped; only the file name is used
        let entries = load_catalog(dir.path(), "../../features.json").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_catalog_files_sorted_json_only() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "b.json", "[]");
        write_catalog(&dir, "a.json", "[]");
        fs::write(dir.path().join("readme.txt"), "not a catalog").unwrap();

        let files = list_catalog_files(dir.path()).unwrap();
        assert_eq!(files, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_catalog_files(&missing).unwrap().is_empty());
    }
}
