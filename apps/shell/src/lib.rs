//! The `tessera` command line shell.
//!
//! Loads the configuration, seeds a registry and answers `summary`, `list` and `lookup`
//! commands against it.

pub mod args;
pub mod manifest;
pub mod output;
pub mod seed;

use crate::args::{Cli, Command};
use crate::manifest::ManifestLoader;
use crate::output::EntityView;
use anyhow::Context;
use std::io::Write;
use std::sync::Arc;
use tessera::kernel::config::TesseraConfig;
use tessera::typemap::TypeMap;
use tracing::info;

/// Builds the registry described by `cli` and `config`.
///
/// # Errors
/// Fails when the demo catalog cannot be registered.
pub fn build_map(cli: &Cli, config: &TesseraConfig) -> anyhow::Result<Arc<TypeMap>> {
    let mut loader = ManifestLoader::default();
    let units: Vec<_> =
        cli.manifests.iter().map(|(namespace, path)| (namespace.clone(), loader.bind(namespace.as_str(), path))).collect();

    let map = tessera::bootstrap_with_loader(config, Arc::new(loader));
    if !cli.bare {
        seed::seed(&map).context("Failed to seed the demo catalog")?;
    }
    for (namespace, unit) in units {
        map.add_dependencies(namespace, [unit]);
    }

    info!(version = map.version(), manifests = cli.manifests.len(), "Type map ready");
    Ok(map)
}

/// Runs the parsed command, writing its output to `out`.
///
/// # Errors
/// Returns lookup, loading and output failures.
pub fn run(cli: &Cli, map: &TypeMap, out: &mut impl Write) -> anyhow::Result<()> {
    match &cli.command {
        Command::Summary => output::summary(out, cli.format, &map.summary()),
        Command::List(args) => {
            let views: Vec<EntityView> =
                map.each_from(args.selection())?.map(|entity| EntityView::from(entity.as_ref())).collect();
            output::entities(out, cli.format, &views)
        },
        Command::Lookup(args) => {
            let entity = map
                .resolve(args.key.as_str(), &args.options())
                .with_context(|| format!("Lookup of `{}` failed", args.key))?;
            output::entity(out, cli.format, &EntityView::from(entity.as_ref()))
        },
    }
}
