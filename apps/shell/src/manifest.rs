//! TOML manifests loaded lazily through [`SourceLoader`].
//!
//! ```toml
//! [[type]]
//! key = "uuid"
//! name = "UUID"
//! aliases = ["guid"]
//!
//! [[directive]]
//! key = "unique"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tessera::typemap::{
    Category, Definition, Dependency, Namespace, SourceLoader, TypeMap, TypeMapError,
};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Manifest {
    #[serde(rename = "type")]
    types: Vec<ManifestEntry>,
    #[serde(rename = "directive")]
    directives: Vec<ManifestEntry>,
    #[serde(rename = "schema")]
    schemas: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    key: String,
    /// Defaults to the key.
    name: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    /// Namespaces besides the one the manifest is bound to.
    #[serde(default)]
    namespaces: Vec<String>,
}

/// Reads manifests bound to namespaces with [`ManifestLoader::bind`].
#[derive(Debug, Default)]
pub struct ManifestLoader {
    bindings: BTreeMap<String, Namespace>,
}

impl ManifestLoader {
    /// Binds the manifest at `path` to `namespace` and returns the unit to queue for it.
    pub fn bind(&mut self, namespace: impl Into<Namespace>, path: impl AsRef<Path>) -> Dependency {
        let locator = path.as_ref().display().to_string();
        self.bindings.insert(locator.clone(), namespace.into());
        Dependency::source(locator)
    }
}

impl SourceLoader for ManifestLoader {
    fn load(&self, locator: &str, map: &TypeMap) -> Result<(), TypeMapError> {
        let namespace = self.bindings.get(locator).cloned().unwrap_or_else(Namespace::base);
        let failed = |message: String| TypeMapError::LoadFailed {
            message: message.into(),
            context: Some(format!("Manifest: {locator}").into()),
        };

        let raw = fs::read_to_string(locator).map_err(|e| failed(e.to_string()))?;
        let manifest: Manifest = toml::from_str(&raw).map_err(|e| failed(e.to_string()))?;

        let groups = [
            (Category::Type, manifest.types),
            (Category::Directive, manifest.directives),
            (Category::Schema, manifest.schemas),
        ];
        let mut loaded = 0_usize;
        for (category, entries) in groups {
            for entry in entries {
                let name = entry.name.unwrap_or_else(|| entry.key.clone());
                let builder = Definition::builder(entry.key, name).category(category).namespace(namespace.clone());
                let builder = entry.namespaces.into_iter().fold(builder, |b, ns| b.namespace(ns));
                let builder = entry.aliases.into_iter().fold(builder, |b, alias| b.alias(alias));
                map.register(builder.build())?;
                loaded += 1;
            }
        }

        debug!(%namespace, locator, loaded, "Manifest loaded");
        Ok(())
    }
}
