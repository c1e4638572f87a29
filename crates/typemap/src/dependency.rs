//! Namespace scoped units loaded on the first lookup miss.

use crate::error::{TypeMapError, TypeMapErrorExt};
use crate::ident::Namespace;
use crate::map::{State, TypeMap};
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

type LoadFn = dyn FnOnce(&TypeMap) -> Result<(), TypeMapError> + Send;

/// A lazily loaded unit of definitions.
pub enum Dependency {
    /// An action that registers or postpones entities when run.
    Loader(Box<LoadFn>),
    /// A locator handed to the map's [`SourceLoader`].
    Source(Cow<'static, str>),
}

impl Dependency {
    pub fn loader<F>(load: F) -> Self
    where
        F: FnOnce(&TypeMap) -> Result<(), TypeMapError> + Send + 'static,
    {
        Self::Loader(Box::new(load))
    }

    pub fn source(locator: impl Into<Cow<'static, str>>) -> Self {
        Self::Source(locator.into())
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loader(_) => f.write_str("Loader(..)"),
            Self::Source(locator) => f.debug_tuple("Source").field(locator).finish(),
        }
    }
}

/// Host side loader for [`Dependency::Source`] units, e.g. a schema file reader.
pub trait SourceLoader: Send + Sync + fmt::Debug {
    /// Loads the definitions found at `locator` into `map`.
    ///
    /// # Errors
    /// Implementations return [`TypeMapError::LoadFailed`] when the source cannot be read.
    fn load(&self, locator: &str, map: &TypeMap) -> Result<(), TypeMapError>;
}

#[derive(Debug, Default)]
pub(crate) struct DependencyQueues {
    queues: Mutex<IndexMap<Namespace, VecDeque<Dependency>, FxBuildHasher>>,
}

impl DependencyQueues {
    fn extend(&self, namespace: Namespace, units: impl IntoIterator<Item = Dependency>) {
        self.queues.lock().entry(namespace).or_default().extend(units);
    }

    /// Takes the next unit out before it runs so it is consumed at most once, even when the
    /// unit itself triggers another load of the same namespace.
    fn pop(&self, namespace: &Namespace) -> Option<Dependency> {
        self.queues.lock().get_mut(namespace)?.pop_front()
    }

    pub(crate) fn namespaces(&self) -> Vec<Namespace> {
        self.queues.lock().keys().cloned().collect()
    }

    /// Queued units per namespace, including drained namespaces.
    pub(crate) fn counts(&self) -> Vec<(Namespace, usize)> {
        self.queues.lock().iter().map(|(namespace, units)| (namespace.clone(), units.len())).collect()
    }
}

impl TypeMap {
    /// Queues units to load the first time a lookup in `namespace` misses.
    pub fn add_dependencies(
        &self,
        namespace: impl Into<Namespace>,
        units: impl IntoIterator<Item = Dependency>,
    ) {
        let namespace = namespace.into();
        debug!(%namespace, "Dependencies queued");
        self.state().dependencies.extend(namespace, units);
    }

    /// Drains the queues of `namespaces` in order and reports whether any unit ran.
    ///
    /// # Errors
    /// Propagates the first failing unit; units after it stay queued.
    pub fn load_dependencies(&self, namespaces: &[Namespace]) -> Result<bool, TypeMapError> {
        self.load_dependencies_in(&self.state(), namespaces)
    }

    pub(crate) fn load_dependencies_in(
        &self,
        state: &State,
        namespaces: &[Namespace],
    ) -> Result<bool, TypeMapError> {
        let mut loaded = false;
        for namespace in namespaces {
            while let Some(unit) = state.dependencies.pop(namespace) {
                loaded = true;
                debug!(%namespace, unit = ?unit, "Loading dependency");
                self.load_unit(unit)
                    .context(format!("While loading dependencies of `{namespace}`"))?;
            }
        }
        Ok(loaded)
    }

    fn load_unit(&self, unit: Dependency) -> Result<(), TypeMapError> {
        match unit {
            Dependency::Loader(load) => load(self),
            Dependency::Source(locator) => match self.source_loader() {
                Some(loader) => loader.load(&locator, self),
                None => Err(TypeMapError::LoadFailed {
                    message: locator,
                    context: Some("no source loader configured".into()),
                }),
            },
        }
    }
}
