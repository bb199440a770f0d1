//! Crash-safe file replacement

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Sibling temp path used while writing `path`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `value` as pretty JSON to `path` without ever exposing a partial file.
///
/// The value is encoded first, written to `<path>.tmp`, flushed to disk and
/// then renamed over `path`. If encoding or any I/O step fails the previous
/// contents of `path` are untouched and the error is returned.
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let display = path.display().to_string();
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
        path: display.clone(),
        source,
    })?;
    bytes.push(b'\n');

    let tmp = temp_path(path);
    let io_err = |source| StoreError::Io {
        path: display.clone(),
        source,
    };

    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_err(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.json");
        fs::write(&path, "old").unwrap();

        atomic_write_json(&path, &vec![1, 2, 3]).unwrap();

        let loaded: Vec<u32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn encode_failure_leaves_destination_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.json");
        fs::write(&path, "original").unwrap();

        // JSON object keys must be strings
        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), 3u8);

        let err = atomic_write_json(&path, &bad).unwrap_err();
        assert!(matches!(err, StoreError::Encode { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("players.json");

        assert!(matches!(
            atomic_write_json(&path, &1u8),
            Err(StoreError::Io { .. })
        ));
    }
}
