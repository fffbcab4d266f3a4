pub mod clean;
pub mod list;
pub mod reset;
pub mod resolve;
pub mod scan;

use crate::cli::{ScopeArgs, SourceArgs};
use anyhow::Result;
use discovery::{DiscoveryConfig, DiscoveryConfigBuilder, DiscoveryContext};
use std::path::PathBuf;

/// Applies command line overrides on top of the loaded configuration.
pub fn override_config(
    mut config: DiscoveryConfig,
    paths: Vec<PathBuf>,
    scope: ScopeArgs,
    no_cache: bool,
) -> Result<DiscoveryConfig> {
    if !paths.is_empty() {
        config.paths = paths;
    }
    if let Some(controller_set) = scope.controller_set {
        config.controller_set = controller_set;
    }
    if let Some(environment) = scope.environment {
        config.environment = environment;
    }
    if no_cache {
        config.use_cache = false;
    }
    Ok(DiscoveryConfigBuilder::from_config(config).build()?)
}

/// An initialized context for commands that only read the discovered graph.
pub fn initialized_context(config: DiscoveryConfig, source: SourceArgs) -> Result<DiscoveryContext> {
    let config = override_config(config, source.paths, source.scope, source.no_cache)?;
    let mut context = DiscoveryContext::from_config(config)?;
    context.initialize()?;
    Ok(context)
}
