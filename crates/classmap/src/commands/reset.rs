use anyhow::Result;
use discovery::{DiscoveryConfig, DiscoveryContext};

pub fn run(config: DiscoveryConfig) -> Result<()> {
    let context = DiscoveryContext::from_config(config)?;
    let cache_key = context.cache_key();

    if context.invalidate_cache()? {
        println!("Removed snapshot for {cache_key}");
    } else {
        println!("No snapshot stored for {cache_key}");
    }
    Ok(())
}
