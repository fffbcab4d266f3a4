use anyhow::Result;
use discovery::DiscoveryContext;

pub struct ResolveArgs {
    pub name: String,
    pub ancestor: Option<String>,
    pub exact: bool,
}

pub fn run(context: &DiscoveryContext, args: ResolveArgs) -> Result<()> {
    let ancestor = args.ancestor.as_deref();
    let key = if args.exact {
        context.resolve_exact(&args.name, ancestor)?
    } else {
        context.resolve_best(&args.name, ancestor)?
    };

    match context.registry().lookup(&key) {
        Some(entry) => println!("{}\t{}", entry.declared_name, entry.source_path.display()),
        None => println!("{key}"),
    }
    Ok(())
}
