//! Descendant sets for every ancestor in the registry.
//!
//! The map is keyed by ancestor and stores the full transitive closure, so
//! "what extends X" is a single lookup. Building it loads every registered
//! class to read its ancestor chain, which is the cost snapshots exist to
//! avoid on later runs.

use crate::errors::{DiscoveryError, Result};
use crate::key::ClassKey;
use crate::loader::{ClassLoader, LoadOutcome};
use crate::registry::ClassRegistry;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InheritanceMap {
    descendants: FxHashMap<ClassKey, BTreeSet<ClassKey>>,
}

impl InheritanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, ancestor: ClassKey, descendant: ClassKey) {
        self.descendants
            .entry(ancestor)
            .or_default()
            .insert(descendant);
    }

    pub fn descendants(&self, key: &ClassKey) -> Option<&BTreeSet<ClassKey>> {
        self.descendants.get(key).filter(|set| !set.is_empty())
    }

    pub fn has_descendants(&self, key: &ClassKey) -> bool {
        self.descendants(key).is_some()
    }

    /// Whether `descendant` extends or implements `ancestor`, directly or
    /// transitively. A class does not descend from itself.
    pub fn is_descendant(&self, descendant: &ClassKey, ancestor: &ClassKey) -> bool {
        self.descendants
            .get(ancestor)
            .is_some_and(|set| set.contains(descendant))
    }

    /// Registered descendants that nothing extends.
    pub fn leaf_descendants(&self, key: &ClassKey) -> Vec<&ClassKey> {
        self.descendants(key)
            .map(|set| {
                set.iter()
                    .filter(|descendant| !self.has_descendants(descendant))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of ancestors with at least one descendant.
    pub fn len(&self) -> usize {
        self.descendants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descendants.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.descendants.values().map(BTreeSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.descendants.clear();
    }

    pub fn to_cached(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.descendants
            .iter()
            .map(|(ancestor, set)| {
                (
                    ancestor.to_string(),
                    set.iter().map(ClassKey::to_string).collect(),
                )
            })
            .collect()
    }

    pub fn from_cached(cached: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut map = Self::new();
        for (ancestor, set) in cached {
            for descendant in set {
                map.add_edge(ClassKey::new(ancestor), ClassKey::new(descendant));
            }
        }
        map
    }
}

/// Ancestors of `key`, nearest first: parents before interfaces, each
/// visited once. Ancestors no loader knows are kept but not walked further.
pub fn ancestor_chain(
    registry: &ClassRegistry,
    loader: &mut dyn ClassLoader,
    key: &ClassKey,
) -> Vec<ClassKey> {
    walk_ancestors(registry, loader, key).0
}

/// The ancestor chain, and whether the walk led back to `key` itself.
fn walk_ancestors(
    registry: &ClassRegistry,
    loader: &mut dyn ClassLoader,
    key: &ClassKey,
) -> (Vec<ClassKey>, bool) {
    let mut chain = Vec::new();
    let mut seen = FxHashSet::default();
    let mut cyclic = false;

    let mut pending = VecDeque::from([key.clone()]);
    while let Some(current) = pending.pop_front() {
        let LoadOutcome::Loaded(descriptor) = loader.load(registry, current.as_str()) else {
            continue;
        };
        for ancestor in descriptor.direct_ancestors() {
            let ancestor = ClassKey::new(ancestor);
            if &ancestor == key {
                cyclic = true;
                continue;
            }
            if seen.insert(ancestor.clone()) {
                chain.push(ancestor.clone());
                pending.push_back(ancestor);
            }
        }
    }

    (chain, cyclic)
}

/// Loads every registered class and records it under each of its ancestors.
pub fn index(registry: &ClassRegistry, loader: &mut dyn ClassLoader) -> Result<InheritanceMap> {
    let mut map = InheritanceMap::new();

    for entry in registry.sorted_entries() {
        if matches!(loader.load(registry, entry.key.as_str()), LoadOutcome::NotFound) {
            warn!(
                "Could not load `{}` from {}, it is indexed without ancestors",
                entry.declared_name,
                entry.source_path.display()
            );
            continue;
        }

        let (chain, cyclic) = walk_ancestors(registry, loader, &entry.key);
        if cyclic {
            return Err(DiscoveryError::InheritanceCycle {
                base: entry.declared_name.clone(),
            });
        }
        debug!("`{}` has {} ancestors", entry.declared_name, chain.len());
        for ancestor in chain {
            map.add_edge(ancestor, entry.key.clone());
        }
    }

    info!(
        "Indexed {} classes into {} inheritance edges",
        registry.len(),
        map.edge_count()
    );
    Ok(map)
}
