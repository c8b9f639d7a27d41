//! Snapshot files.
//!
//! A snapshot is an indented JSON array of `{"key", "value"}` objects, in
//! the order the store listed its keys.

use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;

/// File the staging export is written to and imported from.
pub const EXPORT_FILE_NAME: &str = "consul_export.json";

const BACKUP_FILE_PREFIX: &str = "local_backup_";

/// Reads and writes snapshot files under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory snapshots live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the staging export.
    pub fn export_path(&self) -> PathBuf {
        self.dir.join(EXPORT_FILE_NAME)
    }

    /// Path of a local backup taken at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Timestamp`] if `at` cannot be formatted.
    pub fn backup_path(&self, at: OffsetDateTime) -> SyncResult<PathBuf> {
        Ok(self.dir.join(backup_file_name(at)?))
    }

    /// Writes `records` to `path`, replacing any existing file.
    pub fn write(&self, path: &Path, records: &[Record]) -> SyncResult<()> {
        let data = serde_json::to_vec_pretty(records)?;
        let write_err = |source: std::io::Error| SyncError::SnapshotWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut file = fs::File::create(path).map_err(write_err)?;
        file.write_all(&data).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        debug!(path = %path.display(), records = records.len(), "snapshot written");
        Ok(())
    }

    /// Reads the records stored at `path`.
    pub fn read(&self, path: &Path) -> SyncResult<Vec<Record>> {
        let data = fs::read(path).map_err(|source| SyncError::SnapshotRead {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<Record> =
            serde_json::from_slice(&data).map_err(|source| SyncError::SnapshotParse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), records = records.len(), "snapshot read");
        Ok(records)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Returns `local_backup_<YYYY-MM-DD_HHMMSS>.json` for `at`.
pub fn backup_file_name(at: OffsetDateTime) -> SyncResult<String> {
    let stamp = at.format(format_description!(
        "[year]-[month]-[day]_[hour][minute][second]"
    ))?;
    Ok(format!("{BACKUP_FILE_PREFIX}{stamp}.json"))
}

/// Current wall-clock time, local when the offset is known, UTC otherwise.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;

    #[test]
    fn backup_name_format() {
        let at = datetime!(2024-03-07 09:05:03 UTC);
        assert_eq!(
            backup_file_name(at).unwrap(),
            "local_backup_2024-03-07_090503.json"
        );
    }

    #[test]
    fn paths_are_under_dir() {
        let store = SnapshotStore::new("/var/snapshots");
        assert_eq!(
            store.export_path(),
            PathBuf::from("/var/snapshots/consul_export.json")
        );
        let at = datetime!(2025-12-31 23:59:59 UTC);
        assert_eq!(
            store.backup_path(at).unwrap(),
            PathBuf::from("/var/snapshots/local_backup_2025-12-31_235959.json")
        );
    }

    #[test]
    fn write_then_read_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let records = vec![
            Record::new("z/last", "1"),
            Record::new("a/first", "2"),
            Record::new("m/empty", ""),
        ];

        let path = store.export_path();
        store.write(&path, &records).unwrap();
        assert_eq!(store.read(&path).unwrap(), records);
    }

    #[test]
    fn written_file_is_indented_json() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.export_path();
        store.write(&path, &[Record::new("a", "1")]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  {\n    \"key\": \"a\",\n    \"value\": \"1\"\n  }\n]");
    }

    #[test]
    fn empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.export_path();
        store.write(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(store.read(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let err = store.read(&store.export_path()).unwrap_err();
        assert!(matches!(err, SyncError::SnapshotRead { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.export_path();
        fs::write(&path, r#"{"key": "not an array"}"#).unwrap();
        let err = store.read(&path).unwrap_err();
        assert!(matches!(err, SyncError::SnapshotParse { .. }));
    }

    #[test]
    fn unwritable_dir_is_write_error() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("does-not-exist"));
        let err = store.write(&store.export_path(), &[]).unwrap_err();
        assert!(matches!(err, SyncError::SnapshotWrite { .. }));
    }
}
