//! Whole-file JSON persistence.
//!
//! [`save_json`] replaces the target atomically: the document is written to a
//! temporary file in the same directory and renamed over the target, so a
//! crash mid-write leaves the previous contents intact. Concurrent writers to
//! one path are not coordinated; callers serialize their writes.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::StoreError;

/// Serialize `data` as indented JSON and replace the file at `path`,
/// creating parent directories as needed.
pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let tmp = NamedTempFile::new_in(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush().map_err(|source| StoreError::Io {
            path: tmp.path().to_path_buf(),
            source,
        })?;
    }
    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "saved json");
    Ok(())
}

/// Read and parse the JSON file at `path`, reporting failures.
///
/// A missing or blank file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

/// Read and parse the JSON file at `path`.
///
/// Returns `None` when the file is missing, empty, unreadable, or not valid
/// JSON for `T`. The last two cases are logged as warnings; none of them is
/// an error for the caller.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load json file, treating as empty");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn roundtrip_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a").join("b").join("data.json");
        let data = json!([{"name": "Acme", "jobs": [{"title": "Engineer"}]}, {"name": "Beta"}]);

        save_json(&data, &path).unwrap();
        let loaded: Value = load_json(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn save_is_indented() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        save_json(&json!({"a": [1]}), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"a\""));
    }

    #[test]
    fn save_overwrites_not_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        save_json(&json!([1, 2, 3]), &path).unwrap();
        save_json(&json!([4]), &path).unwrap();
        let loaded: Value = load_json(&path).unwrap();
        assert_eq!(loaded, json!([4]));
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_json::<Value>(&tmp.path().join("nope.json")).is_none());
    }

    #[test]
    fn blank_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.json");
        let blank = tmp.path().join("blank.json");
        fs::write(&empty, "").unwrap();
        fs::write(&blank, "  \n\t ").unwrap();
        assert!(load_json::<Value>(&empty).is_none());
        assert!(load_json::<Value>(&blank).is_none());
    }

    #[test]
    fn malformed_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "[{\"name\": \"Acme\",").unwrap();
        assert!(load_json::<Value>(&path).is_none());
    }

    #[test]
    fn read_reports_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(read_json::<Value>(&path), Err(StoreError::Json(_))));
        assert!(read_json::<Value>(&tmp.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        save_json(&json!([]), &path).unwrap();
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
