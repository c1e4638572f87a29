use crate::callback::CallbackRegistry;
use crate::category::Category;
use crate::config::TypeMapConfig;
use crate::dependency::{DependencyQueues, SourceLoader};
use crate::entity::{Entity, EntityRef};
use crate::ident::{Namespace, Symbol};
use crate::index::{AliasPath, NamespaceIndex, Slot};
use crate::pending::{PendingQueue, SkipRegister};
use crate::summary::Summary;
use crate::version;
use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Every mutable collection of a [`TypeMap`]. Replaced as a whole by [`TypeMap::reset`].
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) index: NamespaceIndex,
    pub(crate) pending: PendingQueue,
    pub(crate) dependencies: DependencyQueues,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) fallbacks: Mutex<IndexSet<(Category, Symbol), FxBuildHasher>>,
    pub(crate) modules: RwLock<FxHashMap<Box<str>, Namespace>>,
    pub(crate) skip: SkipRegister,
    pub(crate) objects: AtomicUsize,
}

/// The type registry.
///
/// A single explicit instance is constructed at startup and shared (`Arc<TypeMap>`) with
/// every consumer. All operations take `&self` and are safe to call from many threads.
///
/// # Example
/// ```rust
/// use tessera_typemap::{Category, Definition, FetchOptions, TypeMap};
///
/// # fn main() -> Result<(), tessera_typemap::TypeMapError> {
/// let map = TypeMap::new();
/// map.register(Definition::builder("color", "Color").alias("colour").build())?;
///
/// let options = FetchOptions::new().category(Category::Type);
/// assert_eq!(map.resolve("colour", &options)?.name(), "Color");
/// # Ok(())
/// # }
/// ```
pub struct TypeMap {
    state: RwLock<Arc<State>>,
    config: TypeMapConfig,
    version: OnceLock<String>,
    source_loader: Option<Arc<dyn SourceLoader>>,
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TypeMapConfig::default())
    }

    #[must_use]
    pub fn with_config(config: TypeMapConfig) -> Self {
        Self {
            state: RwLock::new(Arc::default()),
            config,
            version: OnceLock::new(),
            source_loader: None,
        }
    }

    /// Installs the host loader used for [`Dependency::Source`](crate::Dependency::Source) units.
    #[must_use]
    pub fn with_source_loader(mut self, loader: Arc<dyn SourceLoader>) -> Self {
        self.source_loader = Some(loader);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &TypeMapConfig {
        &self.config
    }

    /// Drops every registration, queue, callback and association at once.
    ///
    /// Operations already running keep working on the state they started with.
    pub fn reset(&self) {
        let previous = std::mem::take(&mut *self.state.write());
        debug!(objects = previous.objects.load(Ordering::Relaxed), "Type map reset");
    }

    /// Opaque cache-busting token, stable for the lifetime of the map.
    pub fn version(&self) -> &str {
        self.version.get_or_init(|| {
            self.config
                .version
                .as_deref()
                .map(version::normalize)
                .filter(|token| !token.is_empty())
                .unwrap_or_else(version::generate)
        })
    }

    /// Declares that entities defined under `module` (and its submodules) belong to `namespace`.
    pub fn associate(&self, namespace: impl Into<Namespace>, module: impl AsRef<str>) {
        let namespace = namespace.into();
        let module = module.as_ref().trim_matches(':');
        debug!(%namespace, module, "Module associated");
        self.state().modules.write().insert(module.into(), namespace);
    }

    /// Namespace declared for `module_path` or its closest associated ancestor.
    #[must_use]
    pub fn associated_namespace_of(&self, module_path: &str) -> Option<Namespace> {
        self.state().associated_namespace_of(module_path)
    }

    /// Number of indexed entities currently registered.
    #[must_use]
    pub fn objects(&self) -> usize {
        self.state().objects.load(Ordering::Acquire)
    }

    /// Missing keys that were replaced by a fallback, in reporting order.
    #[must_use]
    pub fn fallback_reports(&self) -> Vec<(Category, Symbol)> {
        self.state().fallbacks.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let state = self.state();
        Summary {
            version: self.version().to_owned(),
            namespaces: state.index.namespace_count(),
            categories: Category::INDEXED.len(),
            objects: state.objects.load(Ordering::Acquire),
            pending: state.pending.len(),
            callbacks: state.callbacks.len(),
            dependencies: state.dependencies.counts(),
        }
    }

    pub(crate) fn state(&self) -> Arc<State> {
        Arc::clone(&self.state.read())
    }

    pub(crate) fn source_loader(&self) -> Option<&Arc<dyn SourceLoader>> {
        self.source_loader.as_ref()
    }

    /// Turns a stored slot into an entity. Resolvers run and aliases are followed on every
    /// call, so a replaced canonical entity is observed immediately.
    pub(crate) fn resolve_slot(&self, state: &State, slot: &Slot, depth: usize) -> Option<EntityRef> {
        match slot {
            Slot::Direct(entity) => Some(Arc::clone(entity)),
            Slot::Tombstone => None,
            Slot::Resolver(resolver) => resolver(self),
            Slot::Alias(path) => self.follow_alias(state, path, depth),
        }
    }

    fn follow_alias(&self, state: &State, path: &AliasPath, depth: usize) -> Option<EntityRef> {
        if depth >= self.config.max_alias_depth {
            warn!(
                key = %path.key,
                namespace = %path.namespace,
                depth,
                "Alias chain too deep, treating as missing"
            );
            return None;
        }

        let base = Namespace::base();
        let fallback = (!path.exclusive && path.namespace != base).then_some(&base);
        [Some(&path.namespace), fallback].into_iter().flatten().find_map(|namespace| {
            let slot = state.index.get(namespace, path.category, &path.key).ok().flatten()?;
            self.resolve_slot(state, &slot, depth + 1)
        })
    }
}

impl State {
    pub(crate) fn associated_namespace_of(&self, module_path: &str) -> Option<Namespace> {
        let modules = self.modules.read();
        let mut path = module_path.trim_matches(':');
        loop {
            if let Some(namespace) = modules.get(path) {
                return Some(namespace.clone());
            }
            path = &path[..path.rfind("::")?];
        }
    }

    /// Namespaces an entity is written into: its own, else the one its module inherits,
    /// else `base`. Never empty.
    pub(crate) fn namespaces_of(&self, entity: &dyn Entity) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = Vec::with_capacity(entity.namespaces().len());
        for namespace in entity.namespaces() {
            if !namespaces.contains(namespace) {
                namespaces.push(namespace.clone());
            }
        }
        if namespaces.is_empty() {
            let inherited =
                entity.module_path().and_then(|module| self.associated_namespace_of(module));
            namespaces.push(inherited.unwrap_or_else(Namespace::base));
        }
        namespaces
    }
}

impl fmt::Debug for TypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("TypeMap")
            .field("namespaces", &state.index.namespace_count())
            .field("objects", &state.objects.load(Ordering::Relaxed))
            .field("pending", &state.pending.len())
            .field("config", &self.config)
            .field("source_loader", &self.source_loader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Definition;

    #[test]
    fn module_association_walks_ancestors() {
        let map = TypeMap::new();
        map.associate("mysql", "app::mysql");

        assert_eq!(map.associated_namespace_of("app::mysql::types::Json"), Some("mysql".into()));
        assert_eq!(map.associated_namespace_of("app::mysql"), Some("mysql".into()));
        assert_eq!(map.associated_namespace_of("app::pg"), None);
    }

    #[test]
    fn entity_namespaces_default_to_base() {
        let map = TypeMap::new();
        map.associate("mysql", "app::mysql");
        let state = map.state();

        let plain = Definition::builder("a", "A").build();
        let inherited = Definition::builder("b", "B").module("app::mysql::types").build();
        let explicit = Definition::builder("c", "C").namespace("pg").namespace("PG").build();

        assert_eq!(state.namespaces_of(plain.as_ref()), [Namespace::base()]);
        assert_eq!(state.namespaces_of(inherited.as_ref()), [Namespace::from("mysql")]);
        assert_eq!(state.namespaces_of(explicit.as_ref()), [Namespace::from("pg")]);
    }

    #[test]
    fn version_is_configured_or_generated_once() {
        let configured = TypeMap::with_config(TypeMapConfig {
            version: Some("2026.10.17-rc1".into()),
            ..TypeMapConfig::default()
        });
        assert_eq!(configured.version(), "2026.10.");

        let generated = TypeMap::new();
        let first = generated.version().to_owned();
        assert_eq!(first.len(), 8);
        assert_eq!(generated.version(), first);
    }

    #[test]
    fn reset_clears_state() {
        let map = TypeMap::new();
        map.register(Definition::builder("color", "Color").build()).unwrap();
        map.associate("mysql", "app::mysql");
        assert_eq!(map.objects(), 1);

        map.reset();

        assert_eq!(map.objects(), 0);
        assert_eq!(map.associated_namespace_of("app::mysql"), None);
        assert_eq!(map.summary().namespaces, 0);
    }
}
