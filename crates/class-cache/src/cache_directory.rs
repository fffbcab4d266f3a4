//! Cache root management for the class-cache crate
//!
//! All persisted discovery state lives under a single cache root. The
//! layout looks like this:
//!
//! ```text
//! .classmap/
//! ├── snapshots/
//! │   ├── 3f1c0a9e5b7d2c41.json
//! │   ├── 9a02be77c1d4f0e3.json
//! ├── logs/
//! │   ├── classmap.log
//! ```
//!
//! Snapshot file names are hashes of the cache key, so every
//! controller-set/environment pair gets its own file.

use crate::errors::{CacheError, Result};
use crate::snapshot::CacheKey;
use std::path::{Path, PathBuf};

const CLASSMAP_CACHE_DIR_NAME: &str = ".classmap";
const CLASSMAP_SNAPSHOTS_NAME: &str = "snapshots";
const CLASSMAP_LOGS_NAME: &str = "logs";
const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct CacheDirectory {
    pub root_path: PathBuf,
    pub snapshots_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl CacheDirectory {
    pub fn new_system_default() -> Result<Self> {
        let root_path = Self::get_system_cache_directory()?;
        Self::new(root_path)
    }

    pub fn new(root_path: PathBuf) -> Result<Self> {
        let snapshots_dir = root_path.join(CLASSMAP_SNAPSHOTS_NAME);
        let logs_dir = root_path.join(CLASSMAP_LOGS_NAME);
        let cache_dir = Self {
            root_path,
            snapshots_dir,
            logs_dir,
        };
        cache_dir.ensure_directory_structure()?;
        Ok(cache_dir)
    }

    pub fn get_system_cache_directory() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CLASSMAP_CACHE_DIR_NAME))
            .ok_or(CacheError::SystemCacheDirectoryNotFound)
    }

    pub fn snapshot_path(&self, key: &CacheKey) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}.{SNAPSHOT_EXTENSION}", key.file_stem()))
    }

    pub fn ensure_directory_structure(&self) -> Result<()> {
        for dir in [&self.root_path, &self.snapshots_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|_| {
                    CacheError::CacheDirectoryCreationFailed {
                        path: dir.to_path_buf(),
                    }
                })?;
                log::debug!("Created cache directory: {}", dir.display());
            }
        }

        Ok(())
    }

    pub fn list_snapshot_files(&self) -> Result<Vec<PathBuf>> {
        if !self.snapshots_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::with_capacity(8);
        for entry in std::fs::read_dir(&self.snapshots_dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.metadata()?.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(SNAPSHOT_EXTENSION)
            {
                snapshots.push(path);
            }
        }

        snapshots.sort();
        Ok(snapshots)
    }

    pub fn remove_snapshots_directory(&self) -> Result<()> {
        if self.snapshots_dir.exists() {
            std::fs::remove_dir_all(&self.snapshots_dir)?;
            log::info!(
                "Removed snapshots directory: {}",
                self.snapshots_dir.display()
            );
        }

        Ok(())
    }

    fn calculate_directory_size(dir: &Path) -> Result<u64> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut total_size = 0;
        for entry in ignore::WalkBuilder::new(dir).standard_filters(false).build() {
            let Ok(entry) = entry else { continue };
            if let Ok(metadata) = entry.metadata()
                && metadata.is_file()
            {
                total_size += metadata.len();
            }
        }

        Ok(total_size)
    }

    pub fn get_info(&self) -> Result<CacheDirectoryInfo> {
        let total_size = Self::calculate_directory_size(&self.root_path)?;
        let snapshot_files = self.list_snapshot_files()?;

        Ok(CacheDirectoryInfo {
            root_path: self.root_path.clone(),
            total_size,
            snapshot_count: snapshot_files.len(),
            snapshot_files,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CacheDirectoryInfo {
    pub root_path: PathBuf,
    pub total_size: u64,
    pub snapshot_count: usize,
    pub snapshot_files: Vec<PathBuf>,
}

impl CacheDirectoryInfo {
    pub fn format_total_size(&self) -> String {
        format_bytes(self.total_size)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut unit_index = 0;
    let mut temp_bytes = bytes;
    while temp_bytes >= THRESHOLD && unit_index < UNITS.len() - 1 {
        temp_bytes /= THRESHOLD;
        unit_index += 1;
    }

    let divisor = THRESHOLD.pow(unit_index as u32);
    let size = bytes as f64 / divisor as f64;
    format!("{:.1} {}", size, UNITS[unit_index])
}
