use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use rolegate_core::AppResult;

/// Returns the value cached at `path`, or computes, stores, and returns it.
///
/// There is no invalidation policy: the cached value is served until the
/// file is deleted. An unreadable or corrupt cache file falls back to
/// recomputation, and a failed cache write is logged without failing the
/// computation itself.
pub fn compute_or_load<T, F>(path: &Path, compute: F) -> AppResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> AppResult<T>,
{
    if let Ok(contents) = fs::read_to_string(path) {
        match serde_json::from_str(contents.as_str()) {
            Ok(value) => return Ok(value),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "cache entry unreadable, recomputing"
                );
            }
        }
    }

    let value = compute()?;

    match serde_json::to_string(&value) {
        Ok(serialized) => {
            if let Some(parent) = path.parent()
                && let Err(error) = fs::create_dir_all(parent)
            {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "failed to create cache directory"
                );
            }
            if let Err(error) = fs::write(path, serialized) {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "failed to store cache entry"
                );
            }
        }
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to serialize cache entry"
            );
        }
    }

    Ok(value)
}
