//! JSON file helpers for the snapshot store

use super::StoreError;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read a JSON file. Missing or blank files yield `T::default()`.
pub(crate) fn read_json<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    Ok(serde_json::from_slice(&bytes)?)
}

/// Read for query paths: any failure degrades to an empty value
pub(crate) fn read_or_empty<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Unreadable store file, treating as empty");
            T::default()
        }
    }
}

/// Read for write paths.
///
/// A corrupt file is moved aside so the next write starts a fresh file
/// instead of overwriting the damaged one. I/O errors still propagate.
pub(crate) fn read_for_update<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    match read_json(path) {
        Err(StoreError::Json(e)) => {
            let quarantined = quarantine_path(path);
            tracing::warn!(
                path = ?path,
                moved_to = ?quarantined,
                error = %e,
                "Corrupt store file moved aside"
            );
            fs::rename(path, &quarantined)?;
            Ok(T::default())
        }
        other => other,
    }
}

/// Write via a temporary sibling and rename, so readers never see a partial file
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `<name>.corrupt-<timestamp>`, with a counter appended if that is taken
fn quarantine_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = path.with_file_name(format!("{}.corrupt-{}", name, stamp));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}.corrupt-{}-{}", name, stamp, n));
        n += 1;
    }
    candidate
}
