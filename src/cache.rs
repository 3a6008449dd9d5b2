use crate::errors::DataLoadError;
use crate::models::EventTable;
use crate::storage::load_events;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};
use tracing::{debug, info};

/// Identifies one version of a file on disk. A cached table is reused only
/// while the fingerprint is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, DataLoadError> {
        let metadata = fs::metadata(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DataLoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DataLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

#[derive(Debug)]
struct CachedTable {
    fingerprint: Fingerprint,
    table: Arc<EventTable>,
}

/// Memoizes parsed event logs by path.
///
/// An entry is invalidated when the file's modification time or length
/// changes; the next `get_or_load` then re-parses it.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<EventTable>, DataLoadError> {
        let fingerprint = Fingerprint::of(path)?;

        if let Some(cached) = self.entries.get(path) {
            if cached.fingerprint == fingerprint {
                debug!(path = %path.display(), "event log cache hit");
                return Ok(Arc::clone(&cached.table));
            }
            info!(path = %path.display(), "event log changed on disk, reloading");
        }

        let table = Arc::new(load_events(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedTable {
                fingerprint,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn repeated_loads_share_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write(&path, "1,10,100,pv,1511577600\n");

        let mut cache = TableCache::new();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write(&path, "1,10,100,pv,1511577600\n");

        let mut cache = TableCache::new();
        let first = cache.get_or_load(&path).unwrap();
        assert_eq!(first.len(), 1);

        write(&path, "1,10,100,pv,1511577600\n2,11,101,buy,1511578000\n");
        let second = cache.get_or_load(&path).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn invalidate_forces_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write(&path, "1,10,100,pv,1511577600\n");

        let mut cache = TableCache::new();
        let first = cache.get_or_load(&path).unwrap();
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));

        let second = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_file_is_an_error_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = TableCache::new();
        let err = cache.get_or_load(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::NotFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        write(&path, "1,10,100,pv\n");

        let mut cache = TableCache::new();
        let err = cache.get_or_load(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::ColumnCount { .. }));
        assert!(cache.is_empty());
    }
}
