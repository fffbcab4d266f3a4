use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Literal tag appended to every cache key so snapshots never collide with
/// other data keyed by the same controller set and environment.
const CACHE_KEY_TAG: &str = "classmap";

/// Identity of a snapshot: one per controller set and environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Dots and percent signs inside a component are percent-encoded, so
    /// distinct pairs never collapse onto the same key.
    pub fn new(controller_set: &str, environment: &str) -> Self {
        let controller_set = escape_component(controller_set);
        let environment = escape_component(environment);
        Self(format!("{controller_set}.{environment}.{CACHE_KEY_TAG}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable, filesystem-safe file stem for this key.
    pub fn file_stem(&self) -> String {
        generate_key_hash(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_component(component: &str) -> String {
    component.replace('%', "%25").replace('.', "%2E")
}

/// A registry entry as persisted in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub declared_name: String,
    pub source_path: PathBuf,
    pub kind: String,
}

/// Complete persisted state of one discovery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub cache_key: CacheKey,
    /// Framework version that wrote the snapshot; a different version is a miss.
    pub framework_version: String,
    pub created_at: DateTime<Utc>,
    /// Directories scanned to build this snapshot, in configuration order
    pub scanned_paths: Vec<PathBuf>,
    /// Hash of the settings that shape a scan besides the paths
    #[serde(default)]
    pub settings_fingerprint: String,
    /// Normalized class key to its entry
    pub registry: BTreeMap<String, CachedEntry>,
    /// Normalized ancestor key to every key that descends from it
    pub inheritance: BTreeMap<String, BTreeSet<String>>,
    /// Named compiled lists, e.g. the discovered start-up classes
    #[serde(default)]
    pub auxiliary: BTreeMap<String, Vec<String>>,
}

impl CacheSnapshot {
    pub fn new(
        cache_key: CacheKey,
        framework_version: String,
        scanned_paths: Vec<PathBuf>,
        settings_fingerprint: String,
    ) -> Self {
        Self {
            cache_key,
            framework_version,
            created_at: Utc::now(),
            scanned_paths,
            settings_fingerprint,
            registry: BTreeMap::new(),
            inheritance: BTreeMap::new(),
            auxiliary: BTreeMap::new(),
        }
    }

    pub fn class_count(&self) -> usize {
        self.registry.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inheritance.values().map(BTreeSet::len).sum()
    }

    pub fn auxiliary_list(&self, name: &str) -> &[String] {
        self.auxiliary.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this snapshot was built for exactly this key, version, path
    /// list and scan settings.
    pub fn matches(
        &self,
        cache_key: &CacheKey,
        framework_version: &str,
        scanned_paths: &[PathBuf],
        settings_fingerprint: &str,
    ) -> bool {
        &self.cache_key == cache_key
            && self.framework_version == framework_version
            && self.scanned_paths == scanned_paths
            && self.settings_fingerprint == settings_fingerprint
    }
}

pub fn generate_key_hash(key: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hash_bytes = hasher.finalize();

    hex::encode(&hash_bytes[..8])
}
