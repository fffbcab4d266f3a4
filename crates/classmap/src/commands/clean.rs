use anyhow::Result;
use class_cache::SnapshotStore;
use discovery::{DiscoveryConfig, FRAMEWORK_VERSION};
use tracing::info;

pub fn run(config: DiscoveryConfig) -> Result<()> {
    let store = match config.cache_root {
        Some(root) => SnapshotStore::new_with_directory(root, FRAMEWORK_VERSION)?,
        None => SnapshotStore::new_system_default(FRAMEWORK_VERSION)?,
    };

    let cache_info = store.directory().get_info()?;
    let removed = store.wipe()?;
    println!(
        "Removed {removed} snapshots ({}) from {}",
        cache_info.format_total_size(),
        cache_info.root_path.display()
    );
    info!("Clean completed");
    Ok(())
}
