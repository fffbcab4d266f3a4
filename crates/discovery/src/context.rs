use crate::config::DiscoveryConfig;
use crate::errors::{DiscoveryError, Result};
use crate::inheritance::{self, InheritanceMap};
use crate::key::ClassKey;
use crate::loader::{ClassLoader, LoadOutcome, LoaderChain, RegistryLoader};
use crate::registry::{ClassEntry, ClassRegistry};
use crate::resolver::Resolver;
use crate::scanner::{DeclarationScanner, PatternScanner, SourceScanner};
use crate::stats::DiscoveryStatistics;
use class_cache::{CacheKey, CacheSnapshot, SnapshotStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Current framework version; snapshots written by another version are
/// rebuilt.
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Auxiliary list holding every class that descends from the start-up base.
pub const STARTUP_CLASSES: &str = "startup_classes";

/// Owns everything discovered for one process.
///
/// Build it once at startup, call [`DiscoveryContext::initialize`], then
/// hand out shared references: resolution only reads the registry and the
/// inheritance map.
pub struct DiscoveryContext {
    config: DiscoveryConfig,
    scanner: SourceScanner,
    registry: ClassRegistry,
    inheritance: InheritanceMap,
    loaders: LoaderChain,
    store: Option<SnapshotStore>,
    auxiliary: BTreeMap<String, Vec<String>>,
    scanned_paths: Vec<PathBuf>,
    stats: DiscoveryStatistics,
}

impl DiscoveryContext {
    /// A context without snapshot persistence.
    pub fn new(config: DiscoveryConfig) -> Self {
        let scanner = SourceScanner::new(
            Arc::new(PatternScanner::new()),
            config.extensions.clone(),
            config.max_file_size,
        );
        let stats = DiscoveryStatistics::new(&config.controller_set, &config.environment);

        let mut loaders = LoaderChain::new();
        loaders.register(Box::new(RegistryLoader::new(scanner.clone())));

        Self {
            config,
            scanner,
            registry: ClassRegistry::new(),
            inheritance: InheritanceMap::new(),
            loaders,
            store: None,
            auxiliary: BTreeMap::new(),
            scanned_paths: Vec::new(),
            stats,
        }
    }

    /// A context persisting snapshots under the configured cache root, or
    /// the system default root, unless caching is disabled.
    pub fn from_config(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;

        let store = if config.use_cache {
            Some(match &config.cache_root {
                Some(root) => SnapshotStore::new_with_directory(root.clone(), FRAMEWORK_VERSION)?,
                None => SnapshotStore::new_system_default(FRAMEWORK_VERSION)?,
            })
        } else {
            None
        };

        let context = Self::new(config);
        Ok(match store {
            Some(store) => context.with_store(store),
            None => context,
        })
    }

    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the declaration scanner. Loaders registered earlier are
    /// dropped, so call this before [`Self::register_loader`].
    pub fn with_declaration_scanner(mut self, declarations: Arc<dyn DeclarationScanner>) -> Self {
        self.scanner = SourceScanner::new(
            declarations,
            self.config.extensions.clone(),
            self.config.max_file_size,
        );
        self.loaders = LoaderChain::new();
        self.loaders
            .register(Box::new(RegistryLoader::new(self.scanner.clone())));
        self
    }

    /// Adds a loader consulted after the registry loader.
    pub fn register_loader(&mut self, loader: Box<dyn ClassLoader>) {
        self.loaders.register(loader);
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn inheritance(&self) -> &InheritanceMap {
        &self.inheritance
    }

    pub fn statistics(&self) -> &DiscoveryStatistics {
        &self.stats
    }

    pub fn scanned_paths(&self) -> &[PathBuf] {
        &self.scanned_paths
    }

    pub fn cache_key(&self) -> CacheKey {
        self.config.cache_key()
    }

    pub fn auxiliary_list(&self, name: &str) -> &[String] {
        self.auxiliary.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn startup_classes(&self) -> &[String] {
        self.auxiliary_list(STARTUP_CLASSES)
    }

    /// Loads the snapshot for the current configuration, or scans every
    /// configured directory, indexes the result and saves a new snapshot.
    pub fn initialize(&mut self) -> Result<&DiscoveryStatistics> {
        let started = Instant::now();
        self.reset();

        let cache_key = self.cache_key();
        let paths = self.config.resolved_paths();
        let settings = self.config.settings_fingerprint();

        if let Some(store) = &self.store
            && let Some(snapshot) = store.load(&cache_key, &paths, &settings)?
        {
            match self.restore(snapshot) {
                Ok(()) => {
                    self.stats.from_cache = true;
                    self.stats.finish(started.elapsed());
                    info!("Discovery for {cache_key}: {}", self.stats.summary());
                    return Ok(&self.stats);
                }
                Err(e) => {
                    warn!("Discarding inconsistent snapshot for {cache_key}, rebuilding: {e}");
                    self.reset();
                }
            }
        }

        self.scan_paths()?;
        self.build_inheritance()?;
        self.compile_auxiliary();
        self.record_totals();

        if let Some(store) = &self.store {
            store.save(&cache_key, &self.snapshot())?;
        }

        self.stats.finish(started.elapsed());
        info!("Discovery for {cache_key}: {}", self.stats.summary());
        Ok(&self.stats)
    }

    /// Scans every configured directory, in order, into the registry.
    ///
    /// A directory scanned earlier without a [`Self::reset`] is scanned again
    /// but recorded once.
    pub fn scan_paths(&mut self) -> Result<()> {
        for path in self.config.resolved_paths() {
            info!("Scanning {}", path.display());
            let outcome = self.scanner.scan(&path)?;
            for entry in outcome.entries.iter().cloned() {
                self.registry.register(entry)?;
            }
            if self.scanned_paths.contains(&path) {
                debug!("{} was already scanned", path.display());
                continue;
            }
            self.stats.add_scan(&outcome);
            self.scanned_paths.push(path);
        }
        Ok(())
    }

    /// Loads every registered class and rebuilds the inheritance map.
    pub fn build_inheritance(&mut self) -> Result<()> {
        self.inheritance = inheritance::index(&self.registry, &mut self.loaders)?;
        Ok(())
    }

    fn compile_auxiliary(&mut self) {
        let startup_base = ClassKey::new(&self.config.startup_base);
        let startup: Vec<String> = self
            .inheritance
            .descendants(&startup_base)
            .map(|set| {
                set.iter()
                    .filter(|key| self.registry.exists(key))
                    .map(ClassKey::to_string)
                    .collect()
            })
            .unwrap_or_default();

        debug!("Found {} start-up classes", startup.len());
        self.auxiliary.insert(STARTUP_CLASSES.to_string(), startup);
    }

    fn record_totals(&mut self) {
        self.stats.total_classes = self.registry.len();
        self.stats.total_edges = self.inheritance.edge_count();
        self.stats.startup_classes = self.startup_classes().len();
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let mut snapshot = CacheSnapshot::new(
            self.cache_key(),
            FRAMEWORK_VERSION.to_string(),
            self.scanned_paths.clone(),
            self.config.settings_fingerprint(),
        );
        snapshot.registry = self.registry.to_cached();
        snapshot.inheritance = self.inheritance.to_cached();
        snapshot.auxiliary = self.auxiliary.clone();
        snapshot
    }

    /// Replaces the discovered state with a snapshot's.
    pub fn restore(&mut self, snapshot: CacheSnapshot) -> Result<()> {
        let registry = ClassRegistry::from_cached(&snapshot.registry)?;
        self.reset();
        self.registry = registry;
        self.inheritance = InheritanceMap::from_cached(&snapshot.inheritance);
        self.auxiliary = snapshot.auxiliary;
        self.scanned_paths = snapshot.scanned_paths;
        self.record_totals();
        Ok(())
    }

    /// Forgets everything discovered. Required before a class may be
    /// declared again at a different path.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.inheritance.clear();
        self.loaders.reset();
        self.auxiliary.clear();
        self.scanned_paths.clear();
        self.stats = DiscoveryStatistics::new(&self.config.controller_set, &self.config.environment);
    }

    /// Removes the stored snapshot for the current configuration.
    pub fn invalidate_cache(&self) -> Result<bool> {
        match &self.store {
            Some(store) => Ok(store.invalidate(&self.cache_key())?),
            None => Ok(false),
        }
    }

    /// Removes every stored snapshot.
    pub fn wipe_cache(&self) -> Result<usize> {
        match &self.store {
            Some(store) => Ok(store.wipe()?),
            None => Ok(0),
        }
    }

    pub fn resolve_best(&self, base_name: &str, required_ancestor: Option<&str>) -> Result<ClassKey> {
        Resolver::new(&self.registry, &self.inheritance).resolve_best(base_name, required_ancestor)
    }

    pub fn resolve_exact(
        &self,
        base_name: &str,
        required_ancestor: Option<&str>,
    ) -> Result<ClassKey> {
        Resolver::new(&self.registry, &self.inheritance).resolve_exact(base_name, required_ancestor)
    }

    /// [`Self::resolve_best`], returning the registry entry to instantiate.
    pub fn resolve(&self, base_name: &str, required_ancestor: Option<&str>) -> Result<&ClassEntry> {
        let key = self.resolve_best(base_name, required_ancestor)?;
        self.registry
            .lookup(&key)
            .ok_or_else(|| DiscoveryError::not_found(base_name, required_ancestor))
    }

    /// Hook for "class referenced but not loaded yet".
    pub fn load_class(&mut self, name: &str) -> LoadOutcome {
        self.loaders.load(&self.registry, name)
    }

    pub fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        self.inheritance
            .is_descendant(&ClassKey::new(child), &ClassKey::new(ancestor))
    }

    /// Registered descendants of `name`, ordered by key.
    pub fn descendants_of(&self, name: &str) -> Vec<&ClassEntry> {
        self.inheritance
            .descendants(&ClassKey::new(name))
            .map(|set| {
                set.iter()
                    .filter_map(|key| self.registry.lookup(key))
                    .collect()
            })
            .unwrap_or_default()
    }
}
