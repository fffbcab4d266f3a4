use anyhow::Result;
use discovery::{ClassEntry, DiscoveryContext};

pub fn run(context: &DiscoveryContext, descendants_of: Option<&str>) -> Result<()> {
    let entries: Vec<&ClassEntry> = match descendants_of {
        Some(name) => context.descendants_of(name),
        None => context.registry().sorted_entries(),
    };

    for entry in entries {
        // We're printing to stdout, so we don't need to use tracing
        println!(
            "{}\t{}\t{}",
            entry.declared_name,
            entry.kind,
            entry.source_path.display()
        );
    }
    Ok(())
}
