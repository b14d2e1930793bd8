//! JSON file helpers: tolerant reads, atomic writes, lock acquisition

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CircleError;

/// Read JSON from a file, or `T::default()` if the file doesn't exist yet
pub fn read_json<T, P>(path: P) -> Result<T, CircleError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| CircleError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| CircleError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a sibling temp file, fsync, then rename over the target
///
/// Readers see either the old file or the new one, never a partial write.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), CircleError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CircleError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| CircleError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| CircleError::Storage(format!("Failed to serialize data: {}", e)))?;
    writer
        .flush()
        .map_err(|e| CircleError::Storage(format!("Failed to flush data: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| CircleError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CircleError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Exclusive advisory lock on a file, shared by every process using the data directory
///
/// Held until dropped. Blocks while another process holds it.
#[derive(Debug)]
pub struct DirLock {
    file: File,
}

impl DirLock {
    pub fn acquire(path: &Path) -> Result<Self, CircleError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                CircleError::Storage(format!("Failed to open lock file {}: {}", path.display(), e))
            })?;
        file.lock_exclusive().map_err(|e| {
            CircleError::Storage(format!("Failed to lock {}: {}", path.display(), e))
        })?;
        Ok(Self { file })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

pub(crate) fn mutex_lock<T>(lock: &Mutex<T>) -> Result<MutexGuard<'_, T>, CircleError> {
    lock.lock()
        .map_err(|e| CircleError::Storage(format!("Failed to acquire writer lock: {}", e)))
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, CircleError> {
    lock.read()
        .map_err(|e| CircleError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, CircleError> {
    lock.write()
        .map_err(|e| CircleError::Storage(format!("Failed to acquire write lock: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Ledger {
        name: String,
        entries: Vec<i64>,
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Ledger = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Ledger::default());
    }

    #[test]
    fn test_write_then_read_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ledger.json");
        let data = Ledger {
            name: "goa".into(),
            entries: vec![100, -40],
        };

        write_json_atomic(&path, &data).unwrap();

        assert!(!temp_dir.path().join("nested").join("ledger.json.tmp").exists());
        let loaded: Ledger = read_json(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_dir_lock_is_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".lock");

        let held = DirLock::acquire(&path).unwrap();
        let second = File::open(&path).unwrap();
        assert!(second.try_lock_exclusive().is_err());

        drop(held);
        assert!(DirLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<Ledger, _> = read_json(&path);
        assert!(matches!(result, Err(CircleError::Storage(_))));
    }
}
