use crate::cache_directory::CacheDirectory;
use crate::errors::Result;
use crate::snapshot::{CacheKey, CacheSnapshot};
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads and writes discovery snapshots under a cache directory.
///
/// Writes go through a temporary sibling file followed by a rename. There is
/// no cross-process locking: two processes rebuilding the same key both
/// write, and the last rename wins.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: CacheDirectory,
    framework_version: String,
}

impl SnapshotStore {
    pub fn new(directory: CacheDirectory, framework_version: impl Into<String>) -> Self {
        Self {
            directory,
            framework_version: framework_version.into(),
        }
    }

    pub fn new_system_default(framework_version: impl Into<String>) -> Result<Self> {
        Ok(Self::new(
            CacheDirectory::new_system_default()?,
            framework_version,
        ))
    }

    pub fn new_with_directory(
        root_path: PathBuf,
        framework_version: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(CacheDirectory::new(root_path)?, framework_version))
    }

    pub fn directory(&self) -> &CacheDirectory {
        &self.directory
    }

    pub fn framework_version(&self) -> &str {
        &self.framework_version
    }

    pub fn snapshot_path(&self, cache_key: &CacheKey) -> PathBuf {
        self.directory.snapshot_path(cache_key)
    }

    /// Loads the snapshot stored for `cache_key` if it was built from exactly
    /// `scanned_paths` with the same scan settings.
    ///
    /// A missing file, an unreadable or corrupt snapshot, and a snapshot built
    /// for another key, version, path list or settings are all misses.
    pub fn load(
        &self,
        cache_key: &CacheKey,
        scanned_paths: &[PathBuf],
        settings_fingerprint: &str,
    ) -> Result<Option<CacheSnapshot>> {
        let path = self.snapshot_path(cache_key);
        debug!("Loading snapshot {cache_key} from: {}", path.display());

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot stored for {cache_key}");
                return Ok(None);
            }
            Err(e) => {
                warn!("Ignoring unreadable snapshot {}: {e}", path.display());
                return Ok(None);
            }
        };

        let snapshot: CacheSnapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "Discarding corrupt snapshot {}: {e}",
                    path.display()
                );
                return Ok(None);
            }
        };

        if !snapshot.matches(
            cache_key,
            &self.framework_version,
            scanned_paths,
            settings_fingerprint,
        ) {
            info!("Snapshot for {cache_key} is stale, a full rebuild is required");
            return Ok(None);
        }

        info!(
            "Loaded snapshot for {cache_key} with {} classes",
            snapshot.class_count()
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, cache_key: &CacheKey, snapshot: &CacheSnapshot) -> Result<PathBuf> {
        self.directory.ensure_directory_structure()?;
        let path = self.snapshot_path(cache_key);
        debug!("Saving snapshot {cache_key} to: {}", path.display());

        let content = serde_json::to_string_pretty(snapshot)?;
        write_atomically(&path, &content)?;

        info!(
            "Saved snapshot for {cache_key} with {} classes",
            snapshot.class_count()
        );
        Ok(path)
    }

    /// Removes the snapshot for one key. Returns whether a snapshot existed.
    pub fn invalidate(&self, cache_key: &CacheKey) -> Result<bool> {
        let path = self.snapshot_path(cache_key);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Invalidated snapshot for {cache_key}");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every stored snapshot. Returns how many were removed.
    pub fn wipe(&self) -> Result<usize> {
        let removed = self.directory.list_snapshot_files()?.len();
        self.directory.remove_snapshots_directory()?;
        self.directory.ensure_directory_structure()?;
        info!("Wiped {removed} snapshots");
        Ok(removed)
    }

    /// Reads every stored snapshot, skipping files that no longer parse.
    pub fn list(&self) -> Result<Vec<CacheSnapshot>> {
        let mut snapshots = Vec::new();
        for path in self.directory.list_snapshot_files()? {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<CacheSnapshot>(&content) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Skipping unreadable snapshot {}: {e}", path.display()),
            }
        }
        Ok(snapshots)
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
