use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "classmap",
    version,
    about = "Class override discovery",
    long_about = "Scans source trees for class declarations and resolves each component name to its single most-derived override."
)]
pub struct ClassmapCli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to the rolling log file under the cache root instead of STDERR
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl ClassmapCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover classes, reusing the stored snapshot when it is still valid
    Scan {
        /// Directories to scan, in lookup order (replaces the configured paths)
        paths: Vec<PathBuf>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Always scan, and do not store a snapshot
        #[arg(long)]
        no_cache: bool,

        /// Output statistics. Optionally specify a file path to save to.
        #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
        stats: Option<Option<PathBuf>>,
    },
    /// Resolve a component name to the class that should be instantiated
    Resolve {
        /// Logical class name
        name: String,

        /// Only accept classes descending from this ancestor
        #[arg(long, value_name = "NAME")]
        ancestor: Option<String>,

        /// Resolve to the named class itself instead of its override
        #[arg(long)]
        exact: bool,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List registered classes
    List {
        /// Only list classes descending from this one
        #[arg(long, value_name = "NAME")]
        descendants_of: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Remove the snapshot of the active controller set and environment
    Reset {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Remove every stored snapshot
    Clean,
}

/// Which snapshot a command works on.
#[derive(Args, Debug, Default)]
pub struct ScopeArgs {
    /// Controller set, part of the cache key
    #[arg(long)]
    pub controller_set: Option<String>,

    /// Environment, part of the cache key
    #[arg(long = "env")]
    pub environment: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Directory to scan (repeatable, replaces the configured paths)
    #[arg(long = "path", value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Always scan, and do not store a snapshot
    #[arg(long)]
    pub no_cache: bool,
}
