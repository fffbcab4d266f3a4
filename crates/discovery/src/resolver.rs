//! Override resolution.
//!
//! An application overrides a framework class by declaring exactly one
//! subclass per override point. [`Resolver::resolve_best`] answers with the
//! most-derived class below a base name; two unrelated leaves below the same
//! base are a configuration error, never a guess.
//!
//! Resolution is recomputed on every call from the registry and inheritance
//! map; nothing is memoized.

use crate::errors::{DiscoveryError, Result};
use crate::inheritance::InheritanceMap;
use crate::key::ClassKey;
use crate::registry::ClassRegistry;

pub struct Resolver<'a> {
    registry: &'a ClassRegistry,
    inheritance: &'a InheritanceMap,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ClassRegistry, inheritance: &'a InheritanceMap) -> Self {
        Self {
            registry,
            inheritance,
        }
    }

    /// `key` is `ancestor` or descends from it.
    fn satisfies(&self, key: &ClassKey, ancestor: &ClassKey) -> bool {
        key == ancestor || self.inheritance.is_descendant(key, ancestor)
    }

    /// Resolves `base_name` to exactly that registered class, optionally
    /// requiring it to descend from `required_ancestor`.
    pub fn resolve_exact(
        &self,
        base_name: &str,
        required_ancestor: Option<&str>,
    ) -> Result<ClassKey> {
        let key = ClassKey::new(base_name);
        if !self.registry.exists(&key) {
            return Err(DiscoveryError::not_found(base_name, required_ancestor));
        }

        if let Some(ancestor) = required_ancestor
            && !self.satisfies(&key, &ClassKey::new(ancestor))
        {
            return Err(DiscoveryError::not_found(base_name, Some(ancestor)));
        }

        Ok(key)
    }

    /// Resolves `base_name` to its single most-derived descendant.
    ///
    /// - No descendants: the base itself, as for [`Self::resolve_exact`].
    /// - One leaf descendant: that leaf.
    /// - Several leaves: [`DiscoveryError::DivergentOverride`].
    ///
    /// With `required_ancestor`, only leaves descending from it are
    /// candidates. If none are, the base is returned when it satisfies the
    /// constraint itself and is registered; otherwise the result is
    /// [`DiscoveryError::NotFound`].
    pub fn resolve_best(
        &self,
        base_name: &str,
        required_ancestor: Option<&str>,
    ) -> Result<ClassKey> {
        let key = ClassKey::new(base_name);
        if !self.inheritance.has_descendants(&key) {
            return self.resolve_exact(base_name, required_ancestor);
        }

        let mut leaves = self.inheritance.leaf_descendants(&key);

        if let Some(ancestor) = required_ancestor {
            let ancestor_key = ClassKey::new(ancestor);
            leaves.retain(|leaf| self.satisfies(leaf, &ancestor_key));
            if leaves.is_empty() {
                return if self.registry.exists(&key) && self.satisfies(&key, &ancestor_key) {
                    Ok(key)
                } else {
                    Err(DiscoveryError::not_found(base_name, Some(ancestor)))
                };
            }
        }

        match leaves.as_slice() {
            [leaf] => Ok((*leaf).clone()),
            [] => Err(DiscoveryError::InheritanceCycle {
                base: self.registry.display_name(&key),
            }),
            divergent => Err(DiscoveryError::DivergentOverride {
                base: self.registry.display_name(&key),
                branches: divergent
                    .iter()
                    .map(|leaf| self.registry.display_name(leaf))
                    .collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClassEntry;
    use crate::scanner::DeclarationKind;
    use std::path::PathBuf;

    /// Builds a registry and inheritance map from `(class, ancestors)` pairs,
    /// where ancestors are already flattened.
    fn graph(classes: &[(&str, Vec<&str>)]) -> (ClassRegistry, InheritanceMap) {
        let mut registry = ClassRegistry::new();
        let mut inheritance = InheritanceMap::new();
        for (name, ancestors) in classes {
            registry
                .register(ClassEntry::new(
                    name,
                    PathBuf::from(format!("/src/{name}.php")),
                    DeclarationKind::Class,
                ))
                .unwrap();
            for ancestor in ancestors {
                inheritance.add_edge(ClassKey::new(ancestor), ClassKey::new(name));
            }
        }
        (registry, inheritance)
    }

    #[test]
    fn test_exact_requires_registration() {
        let (registry, inheritance) = graph(&[("A", vec![]), ("B", vec!["A"])]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert_eq!(resolver.resolve_exact("b", None).unwrap(), ClassKey::new("B"));
        assert_eq!(
            resolver.resolve_exact("B", Some("a")).unwrap(),
            ClassKey::new("B")
        );
        assert_eq!(
            resolver.resolve_exact("A", Some("A")).unwrap(),
            ClassKey::new("A")
        );
        assert!(matches!(
            resolver.resolve_exact("A", Some("B")),
            Err(DiscoveryError::NotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve_exact("Missing", None),
            Err(DiscoveryError::NotFound { required_ancestor: None, .. })
        ));
    }

    #[test]
    fn test_best_without_descendants_is_the_base() {
        let (registry, inheritance) = graph(&[("Response", vec![])]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert_eq!(
            resolver.resolve_best("response", None).unwrap(),
            ClassKey::new("Response")
        );
        assert!(resolver.resolve_best("Missing", None).is_err());
    }

    #[test]
    fn test_best_follows_single_chain() {
        let (registry, inheritance) = graph(&[
            ("A", vec![]),
            ("B", vec!["A"]),
            ("C", vec!["B", "A"]),
        ]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert_eq!(resolver.resolve_best("A", None).unwrap(), ClassKey::new("C"));
        assert_eq!(resolver.resolve_best("B", None).unwrap(), ClassKey::new("C"));
        assert_eq!(resolver.resolve_best("C", None).unwrap(), ClassKey::new("C"));
    }

    #[test]
    fn test_best_rejects_divergent_leaves() {
        let (registry, inheritance) = graph(&[
            ("Widget", vec![]),
            ("SpecialWidget", vec!["Widget"]),
            ("OtherWidget", vec!["Widget"]),
        ]);
        let resolver = Resolver::new(&registry, &inheritance);

        match resolver.resolve_best("widget", None).unwrap_err() {
            DiscoveryError::DivergentOverride { base, branches } => {
                assert_eq!(base, "Widget");
                assert_eq!(branches, vec!["OtherWidget", "SpecialWidget"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_divergence_below_an_intermediate_class() {
        // A <- B <- {C, D}: both leaves sit under B, still divergent.
        let (registry, inheritance) = graph(&[
            ("A", vec![]),
            ("B", vec!["A"]),
            ("C", vec!["B", "A"]),
            ("D", vec!["B", "A"]),
        ]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert!(matches!(
            resolver.resolve_best("A", None),
            Err(DiscoveryError::DivergentOverride { .. })
        ));
        assert!(matches!(
            resolver.resolve_best("B", None),
            Err(DiscoveryError::DivergentOverride { .. })
        ));
    }

    #[test]
    fn test_required_ancestor_filters_leaves() {
        // Two branches below Base; only one also implements Cacheable.
        let (registry, inheritance) = graph(&[
            ("Base", vec![]),
            ("Cacheable", vec![]),
            ("Plain", vec!["Base"]),
            ("Cached", vec!["Base", "Cacheable"]),
        ]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert!(resolver.resolve_best("Base", None).is_err());
        assert_eq!(
            resolver.resolve_best("Base", Some("Cacheable")).unwrap(),
            ClassKey::new("Cached")
        );
    }

    #[test]
    fn test_empty_filter_without_satisfying_base_is_not_found() {
        let (registry, inheritance) = graph(&[
            ("A", vec![]),
            ("B", vec!["A"]),
            ("Unrelated", vec![]),
        ]);
        let resolver = Resolver::new(&registry, &inheritance);

        match resolver.resolve_best("A", Some("Unrelated")).unwrap_err() {
            DiscoveryError::NotFound {
                name,
                required_ancestor,
            } => {
                assert_eq!(name, "A");
                assert_eq!(required_ancestor.as_deref(), Some("Unrelated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_best_for_unregistered_base_with_descendants() {
        // Framework base types outside the scanned trees can still be
        // resolved through their registered descendants.
        let (registry, inheritance) = graph(&[("AppException", vec!["Exception"])]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert_eq!(
            resolver.resolve_best("Exception", None).unwrap(),
            ClassKey::new("AppException")
        );
        assert!(resolver.resolve_exact("Exception", None).is_err());
    }

    #[test]
    fn test_cyclic_graph_has_no_best() {
        let (registry, inheritance) = graph(&[("Chicken", vec!["Egg"]), ("Egg", vec!["Chicken"])]);
        let resolver = Resolver::new(&registry, &inheritance);

        assert!(matches!(
            resolver.resolve_best("Chicken", None),
            Err(DiscoveryError::InheritanceCycle { .. })
        ));
    }
}
