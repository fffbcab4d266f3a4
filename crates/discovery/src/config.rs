use crate::errors::{DiscoveryError, Result};
use crate::key::ClassKey;
use class_cache::CacheKey;
use class_cache::snapshot::generate_key_hash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONTROLLER_SET: &str = "default";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_STARTUP_BASE: &str = "Bootstrap";
pub const DEFAULT_MAX_FILE_SIZE: usize = 5_000_000;
pub const DEFAULT_EXTENSIONS: &[&str] = &["php", "inc"];

/// Settings for one discovery context.
///
/// `paths` is ordered: framework defaults, then plugins, then the
/// application, then the selected controller-set directory. The order only
/// shows up in error messages; resolution works on the merged graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub paths: Vec<PathBuf>,
    pub controller_set: String,
    pub environment: String,
    pub cache_root: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub startup_base: String,
    pub max_file_size: usize,
    pub use_cache: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            controller_set: DEFAULT_CONTROLLER_SET.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            cache_root: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            startup_base: DEFAULT_STARTUP_BASE.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            use_cache: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DiscoveryError::Config(e.to_string()))
    }

    /// Reads a TOML config file. Relative `paths` and `cache_root` are taken
    /// relative to the file's directory.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            config.paths = config.paths.iter().map(|p| base.join(p)).collect();
            config.cache_root = config.cache_root.map(|root| base.join(root));
        }
        Ok(config)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.controller_set, &self.environment)
    }

    /// Hash of every setting besides `paths` that changes what a scan
    /// produces. Snapshots built under other settings are misses.
    pub fn settings_fingerprint(&self) -> String {
        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        extensions.sort();
        extensions.dedup();

        generate_key_hash(&format!(
            "extensions={};max_file_size={};startup_base={}",
            extensions.join(","),
            self.max_file_size,
            ClassKey::new(&self.startup_base)
        ))
    }

    /// Configured directories in canonical form where they exist, so that the
    /// same tree reached through different spellings shares a snapshot.
    pub fn resolved_paths(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .map(|path| dunce::canonicalize(path).unwrap_or_else(|_| path.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.controller_set.trim().is_empty() {
            return Err(DiscoveryError::Config(
                "controller_set must not be empty".to_string(),
            ));
        }
        if self.environment.trim().is_empty() {
            return Err(DiscoveryError::Config(
                "environment must not be empty".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(DiscoveryError::Config(
                "at least one source extension is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.push(path.into());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn controller_set(mut self, controller_set: impl Into<String>) -> Self {
        self.config.controller_set = controller_set.into();
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    pub fn cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.config.cache_root = Some(cache_root.into());
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn startup_base(mut self, startup_base: impl Into<String>) -> Self {
        self.config.startup_base = startup_base.into();
        self
    }

    pub fn max_file_size(mut self, max_file_size: usize) -> Self {
        self.config.max_file_size = max_file_size;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.config.use_cache = use_cache;
        self
    }

    pub fn build(self) -> Result<DiscoveryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
