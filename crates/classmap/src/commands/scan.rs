use anyhow::Result;
use discovery::{DiscoveryConfig, DiscoveryContext, DiscoveryStatistics};
use std::path::PathBuf;
use tracing::{error, info, warn};

fn handle_statistics_output(stats: &DiscoveryStatistics, stats_output: Option<Option<PathBuf>>) {
    let Some(stats_path_option) = stats_output else {
        return;
    };

    if let Some(stats_path) = stats_path_option {
        match stats.export_to_file(&stats_path) {
            Ok(_) => info!("Statistics saved to: {}", stats_path.display()),
            Err(e) => error!("Failed to save statistics: {e}"),
        }
    }

    info!("Discovery Summary:");
    info!("  - Total Classes: {}", stats.total_classes);
    info!("  - Inheritance Edges: {}", stats.total_edges);
    info!("  - Start-up Classes: {}", stats.startup_classes);

    if !stats.directories.is_empty() {
        info!("Directories:");
        for directory in &stats.directories {
            info!(
                "  - {}: {} files scanned, {} ignored, {} skipped, {} declarations",
                directory.path.display(),
                directory.files_scanned,
                directory.files_ignored,
                directory.files_skipped,
                directory.declarations
            );
        }
    }

    for warning in stats.warnings.iter().take(10) {
        warn!("  - {}: {}", warning.path.display(), warning.reason);
    }
    if stats.warnings.len() > 10 {
        warn!("  ... and {} more warnings", stats.warnings.len() - 10);
    }
}

pub fn run(config: DiscoveryConfig, stats_output: Option<Option<PathBuf>>) -> Result<()> {
    let mut context = DiscoveryContext::from_config(config)?;
    context.initialize()?;

    println!("{}: {}", context.cache_key(), context.statistics().summary());
    handle_statistics_output(context.statistics(), stats_output);
    Ok(())
}
