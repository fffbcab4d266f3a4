//! Class discovery and override resolution.
//!
//! Source trees are scanned for class and interface declarations, every
//! discovered class is loaded to learn its ancestors, and logical component
//! names are resolved to the single most-derived registered implementation.
//! The resulting registry and inheritance map are persisted through
//! `class-cache` so later runs can skip the scan.

pub mod config;
pub mod context;
pub mod errors;
pub mod inheritance;
pub mod key;
pub mod loader;
pub mod project;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod stats;

pub use config::{DiscoveryConfig, DiscoveryConfigBuilder};
pub use context::{DiscoveryContext, FRAMEWORK_VERSION, STARTUP_CLASSES};
pub use errors::{DiscoveryError, Result};
pub use inheritance::InheritanceMap;
pub use key::ClassKey;
pub use loader::{ClassLoader, DescriptorTable, LoadOutcome, LoaderChain, RegistryLoader};
pub use registry::{ClassEntry, ClassRegistry};
pub use resolver::Resolver;
pub use scanner::{DeclarationKind, DeclarationScanner, PatternScanner, TypeDescriptor};
pub use stats::DiscoveryStatistics;

#[cfg(test)]
mod tests;
