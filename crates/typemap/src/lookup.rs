use crate::category::Category;
use crate::entity::{Entity, EntityRef};
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::index::Slot;
use crate::map::{State, TypeMap};
use crate::options::{FetchOptions, PreventRegister};
use crate::pending::SkipGuard;
use tracing::{trace, warn};

/// Outcome of one pass over the candidate namespaces.
enum Probe {
    Hit { entity: EntityRef, via_fallback: bool },
    /// Nothing resolved, but a tombstone was seen: the entity was removed on purpose.
    Removed,
    Miss,
}

impl TypeMap {
    /// Looks `key` up without raising on a miss.
    ///
    /// Namespaces are searched in order, trying the key and then the fallback key in each one.
    /// Pending registrations are flushed first unless the options prevent it.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed categories and
    /// propagates failures of the pending flush.
    pub fn fetch(
        &self,
        key: impl Into<Symbol>,
        options: &FetchOptions,
    ) -> Result<Option<EntityRef>, TypeMapError> {
        let key = key.into();
        let category = options.category.ensure_indexed()?;
        let state = self.state();
        let _skip = self.prepare(&state, options)?;

        let namespaces = state.candidate_namespaces(&options.namespaces, options.exclusive);
        let keys: Vec<Symbol> = std::iter::once(key.clone()).chain(options.fallback.clone()).collect();

        match self.probe(&state, &keys, category, &namespaces)? {
            Probe::Hit { entity, via_fallback } => {
                if via_fallback {
                    self.report_fallback(&state, category, &key, &entity);
                }
                Ok(Some(entity))
            },
            Probe::Removed | Probe::Miss => Ok(None),
        }
    }

    /// Looks `key` up, loading the dependencies of the searched namespaces on a miss.
    ///
    /// A miss triggers one dependency load and one retry. When that fails as well the
    /// fallback key is used, with a one-time warning. Keys that were unregistered never
    /// trigger dependency loading.
    ///
    /// # Errors
    /// Returns [`TypeMapError::NotFound`] when nothing resolves, and propagates flush and
    /// dependency failures.
    pub fn resolve(
        &self,
        key: impl Into<Symbol>,
        options: &FetchOptions,
    ) -> Result<EntityRef, TypeMapError> {
        let key = key.into();
        let category = options.category.ensure_indexed()?;
        let state = self.state();
        let _skip = self.prepare(&state, options)?;

        let primary = std::slice::from_ref(&key);
        let mut namespaces =
            state.candidate_namespaces(&options.namespaces, options.exclusive);
        let mut outcome = self.probe(&state, primary, category, &namespaces)?;

        if matches!(outcome, Probe::Miss) && self.load_dependencies_in(&state, &namespaces)? {
            trace!(%key, %category, "Retrying after dependency load");
            self.flush(&state, options)?;
            namespaces = state.candidate_namespaces(&options.namespaces, options.exclusive);
            outcome = self.probe(&state, primary, category, &namespaces)?;
        }
        if let Probe::Hit { entity, .. } = outcome {
            return Ok(entity);
        }

        if let Some(fallback) = &options.fallback
            && let Probe::Hit { entity, .. } =
                self.probe(&state, std::slice::from_ref(fallback), category, &namespaces)?
        {
            self.report_fallback(&state, category, &key, &entity);
            return Ok(entity);
        }

        Err(TypeMapError::NotFound { key, category, context: None })
    }

    /// Whether `key` resolves, never flushing pending registrations.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed categories.
    pub fn exists(
        &self,
        key: impl Into<Symbol>,
        options: &FetchOptions,
    ) -> Result<bool, TypeMapError> {
        let options = options.clone().suppress_registration();
        Ok(self.fetch(key, &options)?.is_some())
    }

    /// Whether `entity`'s key resolves in its own namespaces and category.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed entities.
    pub fn object_exists(&self, entity: &dyn Entity) -> Result<bool, TypeMapError> {
        let namespaces = self.state().namespaces_of(entity);
        let options = FetchOptions::new()
            .category(entity.category())
            .namespaces(namespaces)
            .suppress_registration();
        self.exists(entity.key(), &options)
    }

    /// Pushes the skip set of `options` for the current thread, then flushes.
    fn prepare<'s>(
        &self,
        state: &'s State,
        options: &FetchOptions,
    ) -> Result<Option<SkipGuard<'s>>, TypeMapError> {
        let guard = match &options.prevent_register {
            PreventRegister::Skip(set) => Some(state.skip.push(set.clone())),
            PreventRegister::Flush | PreventRegister::Suppress => None,
        };
        self.flush(state, options)?;
        Ok(guard)
    }

    fn flush(&self, state: &State, options: &FetchOptions) -> Result<(), TypeMapError> {
        match options.prevent_register {
            PreventRegister::Suppress => Ok(()),
            PreventRegister::Flush | PreventRegister::Skip(_) => self.register_pending(state),
        }
    }

    fn probe(
        &self,
        state: &State,
        keys: &[Symbol],
        category: Category,
        namespaces: &[Namespace],
    ) -> Result<Probe, TypeMapError> {
        let mut removed = false;
        for namespace in namespaces {
            for (position, key) in keys.iter().enumerate() {
                match state.index.get(namespace, category, key)? {
                    None => {},
                    Some(Slot::Tombstone) => removed = true,
                    Some(slot) => {
                        if let Some(entity) = self.resolve_slot(state, &slot, 0) {
                            return Ok(Probe::Hit { entity, via_fallback: position > 0 });
                        }
                    },
                }
            }
        }
        Ok(if removed { Probe::Removed } else { Probe::Miss })
    }

    fn report_fallback(
        &self,
        state: &State,
        category: Category,
        missing: &Symbol,
        substitute: &EntityRef,
    ) {
        let first = state.fallbacks.lock().insert((category, missing.clone()));
        if first && self.config().report_fallbacks {
            warn!(
                %category,
                missing = %missing,
                substitute = substitute.name(),
                "Missing entity replaced by fallback"
            );
        }
    }
}

impl State {
    /// The requested namespaces, or every known one, followed by `base` unless exclusive.
    pub(crate) fn candidate_namespaces(
        &self,
        requested: &[Namespace],
        exclusive: bool,
    ) -> Vec<Namespace> {
        let mut namespaces = if requested.is_empty() {
            let mut known = self.index.namespaces();
            for namespace in self.dependencies.namespaces() {
                if !known.contains(&namespace) {
                    known.push(namespace);
                }
            }
            known
        } else {
            requested.to_vec()
        };
        if !exclusive && !namespaces.iter().any(Namespace::is_base) {
            namespaces.push(Namespace::base());
        }
        namespaces
    }
}
