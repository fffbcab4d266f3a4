use crate::errors::{DiscoveryError, Result};
use crate::key::ClassKey;
use crate::scanner::DeclarationKind;
use class_cache::CachedEntry;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One declared class or interface and the file declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub key: ClassKey,
    pub declared_name: String,
    pub source_path: PathBuf,
    pub kind: DeclarationKind,
}

impl ClassEntry {
    pub fn new(declared_name: &str, source_path: PathBuf, kind: DeclarationKind) -> Self {
        Self {
            key: ClassKey::new(declared_name),
            declared_name: declared_name.to_string(),
            source_path,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    /// Same key from the same file, e.g. a directory scanned twice
    AlreadyRegistered,
}

/// Every discovered class, keyed case-insensitively.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClassRegistry {
    entries: FxHashMap<ClassKey, ClassEntry>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. A key already registered from a different file is a
    /// duplicate declaration; from the same file it is a no-op.
    pub fn register(&mut self, entry: ClassEntry) -> Result<RegisterOutcome> {
        if let Some(existing) = self.entries.get(&entry.key) {
            if same_file(&existing.source_path, &entry.source_path) {
                return Ok(RegisterOutcome::AlreadyRegistered);
            }
            return Err(DiscoveryError::DuplicateDeclaration {
                key: existing.declared_name.clone(),
                first: existing.source_path.clone(),
                second: entry.source_path,
            });
        }

        self.entries.insert(entry.key.clone(), entry);
        Ok(RegisterOutcome::Added)
    }

    pub fn lookup(&self, key: &ClassKey) -> Option<&ClassEntry> {
        self.entries.get(key)
    }

    pub fn lookup_name(&self, name: &str) -> Option<&ClassEntry> {
        self.lookup(&ClassKey::new(name))
    }

    pub fn exists(&self, key: &ClassKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Declared spelling of a key, falling back to the key itself for
    /// classes that were never registered.
    pub fn display_name(&self, key: &ClassKey) -> String {
        self.lookup(key)
            .map(|entry| entry.declared_name.clone())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.entries.values()
    }

    /// Entries ordered by key.
    pub fn sorted_entries(&self) -> Vec<&ClassEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn to_cached(&self) -> BTreeMap<String, CachedEntry> {
        self.entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.to_string(),
                    CachedEntry {
                        declared_name: entry.declared_name.clone(),
                        source_path: entry.source_path.clone(),
                        kind: entry.kind.to_string(),
                    },
                )
            })
            .collect()
    }

    pub fn from_cached(cached: &BTreeMap<String, CachedEntry>) -> Result<Self> {
        let mut registry = Self::new();
        for (key, cached_entry) in cached {
            let kind = cached_entry.kind.parse::<DeclarationKind>().map_err(|_| {
                DiscoveryError::Config(format!(
                    "snapshot entry `{key}` has unknown kind `{}`",
                    cached_entry.kind
                ))
            })?;
            let entry = ClassEntry::new(
                &cached_entry.declared_name,
                cached_entry.source_path.clone(),
                kind,
            );
            if entry.key.as_str() != key {
                return Err(DiscoveryError::Config(format!(
                    "snapshot entry `{key}` does not match its declared name `{}`",
                    cached_entry.declared_name
                )));
            }
            registry.register(entry)?;
        }
        Ok(registry)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (dunce::canonicalize(a), dunce::canonicalize(b)),
            (Ok(a), Ok(b)) if a == b
        )
}
