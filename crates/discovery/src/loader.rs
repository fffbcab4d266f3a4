//! Loading classes on demand.
//!
//! Referencing a class that has not been loaded yet asks each registered
//! [`ClassLoader`] in turn. The [`RegistryLoader`] answers from the class
//! registry: it finds the declaring file, includes it once, and hands back
//! the descriptor of the requested type. Names it does not know produce
//! [`LoadOutcome::NotFound`] so loaders registered after it get a chance.
//!
//! The [`DescriptorTable`] loader serves types registered programmatically,
//! for example framework base types that do not live in a scanned tree.

use crate::key::ClassKey;
use crate::registry::ClassRegistry;
use crate::scanner::{SourceScanner, TypeDescriptor};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(TypeDescriptor),
    NotFound,
}

impl LoadOutcome {
    pub fn descriptor(self) -> Option<TypeDescriptor> {
        match self {
            Self::Loaded(descriptor) => Some(descriptor),
            Self::NotFound => None,
        }
    }
}

pub trait ClassLoader {
    fn load(&mut self, registry: &ClassRegistry, name: &str) -> LoadOutcome;

    /// Drops anything loaded so far.
    fn reset(&mut self) {}
}

/// Includes registered source files and remembers what they declared.
pub struct RegistryLoader {
    scanner: SourceScanner,
    included: FxHashSet<PathBuf>,
    loaded: FxHashMap<ClassKey, TypeDescriptor>,
}

impl RegistryLoader {
    pub fn new(scanner: SourceScanner) -> Self {
        Self {
            scanner,
            included: FxHashSet::default(),
            loaded: FxHashMap::default(),
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(&ClassKey::new(name))
    }

    pub fn included_files(&self) -> usize {
        self.included.len()
    }

    fn include(&mut self, path: &Path) {
        if !self.included.insert(path.to_path_buf()) {
            return;
        }

        match self.scanner.scan_file(path) {
            Ok(descriptors) => {
                debug!("Included {} ({} declarations)", path.display(), descriptors.len());
                for descriptor in descriptors {
                    self.loaded.entry(descriptor.key()).or_insert(descriptor);
                }
            }
            Err(e) => warn!("Could not include {}: {}", e.file_path(), e.reason()),
        }
    }
}

impl ClassLoader for RegistryLoader {
    fn load(&mut self, registry: &ClassRegistry, name: &str) -> LoadOutcome {
        let key = ClassKey::new(name);
        if let Some(descriptor) = self.loaded.get(&key) {
            return LoadOutcome::Loaded(descriptor.clone());
        }

        let Some(entry) = registry.lookup(&key) else {
            return LoadOutcome::NotFound;
        };
        let source_path = entry.source_path.clone();
        self.include(&source_path);

        match self.loaded.get(&key) {
            Some(descriptor) => LoadOutcome::Loaded(descriptor.clone()),
            None => {
                warn!(
                    "{} no longer declares `{}`",
                    source_path.display(),
                    entry.declared_name
                );
                LoadOutcome::NotFound
            }
        }
    }

    fn reset(&mut self) {
        self.included.clear();
        self.loaded.clear();
    }
}

/// Descriptors registered explicitly instead of discovered on disk.
#[derive(Debug, Default, Clone)]
pub struct DescriptorTable {
    descriptors: FxHashMap<ClassKey, TypeDescriptor>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.descriptors.insert(descriptor.key(), descriptor);
    }

    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl ClassLoader for DescriptorTable {
    fn load(&mut self, _registry: &ClassRegistry, name: &str) -> LoadOutcome {
        match self.descriptors.get(&ClassKey::new(name)) {
            Some(descriptor) => LoadOutcome::Loaded(descriptor.clone()),
            None => LoadOutcome::NotFound,
        }
    }
}

/// Loaders in registration order; the first hit wins.
#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Box<dyn ClassLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loader: Box<dyn ClassLoader>) {
        self.loaders.push(loader);
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl ClassLoader for LoaderChain {
    fn load(&mut self, registry: &ClassRegistry, name: &str) -> LoadOutcome {
        for loader in &mut self.loaders {
            if let LoadOutcome::Loaded(descriptor) = loader.load(registry, name) {
                return LoadOutcome::Loaded(descriptor);
            }
        }
        LoadOutcome::NotFound
    }

    fn reset(&mut self) {
        for loader in &mut self.loaders {
            loader.reset();
        }
    }
}
