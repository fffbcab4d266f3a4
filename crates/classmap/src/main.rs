mod cli;
mod commands;

use crate::cli::{ClassmapCli, Commands};
use crate::commands::resolve::ResolveArgs;
use anyhow::Result;
use discovery::DiscoveryConfig;
use logging::LogMode;
use std::path::Path;

fn load_config(path: Option<&Path>) -> Result<DiscoveryConfig> {
    match path {
        Some(path) => Ok(DiscoveryConfig::from_toml_file(path)?),
        None => Ok(DiscoveryConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = ClassmapCli::parse_args();
    let config = load_config(cli.config.as_deref())?;

    let mode = if cli.log_file {
        LogMode::File {
            cache_root: config.cache_root.clone(),
        }
    } else {
        LogMode::Cli
    };
    let _guards = logging::init(mode, cli.verbose)?;

    match cli.command {
        Commands::Scan {
            paths,
            scope,
            no_cache,
            stats,
        } => {
            let config = commands::override_config(config, paths, scope, no_cache)?;
            commands::scan::run(config, stats)
        }
        Commands::Resolve {
            name,
            ancestor,
            exact,
            source,
        } => {
            let context = commands::initialized_context(config, source)?;
            commands::resolve::run(
                &context,
                ResolveArgs {
                    name,
                    ancestor,
                    exact,
                },
            )
        }
        Commands::List {
            descendants_of,
            source,
        } => {
            let context = commands::initialized_context(config, source)?;
            commands::list::run(&context, descendants_of.as_deref())
        }
        Commands::Reset { scope } => {
            let mut config = commands::override_config(config, Vec::new(), scope, false)?;
            config.use_cache = true;
            commands::reset::run(config)
        }
        Commands::Clean => commands::clean::run(config),
    }
}
