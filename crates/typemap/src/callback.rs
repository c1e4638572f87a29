//! Continuations waiting for an entity to be registered.

use crate::category::Category;
use crate::entity::EntityRef;
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::map::TypeMap;
use crate::options::FetchOptions;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Invoked exactly once with the registered entity.
pub type Continuation = Box<dyn FnOnce(&EntityRef) + Send>;

/// What [`TypeMap::after_register`] did with the continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    /// The key already resolved and the continuation ran before returning.
    Fired,
    /// The continuation waits for a matching registration.
    Queued,
}

struct CallbackRecord {
    id: u64,
    category: Category,
    namespaces: Vec<Namespace>,
    continuation: Continuation,
}

impl CallbackRecord {
    fn matches(&self, category: Category, namespaces: &[Namespace]) -> bool {
        self.category == category
            && self.namespaces.iter().any(|wanted| wanted.is_base() || namespaces.contains(wanted))
    }
}

#[derive(Default)]
pub(crate) struct CallbackRegistry {
    records: Mutex<FxHashMap<Symbol, Vec<CallbackRecord>>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    fn push(
        &self,
        key: Symbol,
        category: Category,
        namespaces: Vec<Namespace>,
        continuation: Continuation,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = CallbackRecord { id, category, namespaces, continuation };
        self.records.lock().entry(key).or_default().push(record);
        id
    }

    fn remove(&self, key: &Symbol, id: u64) -> Option<Continuation> {
        let mut records = self.records.lock();
        let queue = records.get_mut(key)?;
        let position = queue.iter().position(|record| record.id == id)?;
        let record = queue.remove(position);
        if queue.is_empty() {
            records.remove(key);
        }
        Some(record.continuation)
    }

    /// Removes the records registered for `key` that match the entity, most recent first.
    pub(crate) fn take_matching(
        &self,
        key: &Symbol,
        category: Category,
        namespaces: &[Namespace],
    ) -> Vec<Continuation> {
        let mut records = self.records.lock();
        let Some(queue) = records.get_mut(key) else {
            return Vec::new();
        };

        let mut fired = Vec::new();
        let mut index = queue.len();
        while index > 0 {
            index -= 1;
            if queue[index].matches(category, namespaces) {
                fired.push(queue.remove(index).continuation);
            }
        }
        if queue.is_empty() {
            records.remove(key);
        }
        fired
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().values().map(Vec::len).sum()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry").field("queued", &self.len()).finish()
    }
}

impl TypeMap {
    /// Runs `continuation` once the entity behind `key` is available.
    ///
    /// When the key already resolves the continuation runs immediately, without flushing
    /// pending registrations. Otherwise it is queued and runs synchronously inside the
    /// registration that makes the key available. The options select the category and the
    /// namespaces to watch; `base` is watched as a wildcard unless the options are exclusive.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed categories.
    ///
    /// # Example
    /// ```rust
    /// use std::sync::{Arc, Mutex};
    /// use tessera_typemap::{CallbackState, Definition, FetchOptions, TypeMap};
    ///
    /// # fn main() -> Result<(), tessera_typemap::TypeMapError> {
    /// let map = TypeMap::new();
    /// let seen = Arc::new(Mutex::new(None));
    /// let sink = Arc::clone(&seen);
    ///
    /// let state = map.after_register("color", &FetchOptions::new(), move |entity| {
    ///     *sink.lock().unwrap() = Some(entity.name().to_owned());
    /// })?;
    /// assert_eq!(state, CallbackState::Queued);
    ///
    /// map.register(Definition::builder("color", "Color").build())?;
    /// assert_eq!(seen.lock().unwrap().as_deref(), Some("Color"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn after_register<F>(
        &self,
        key: impl Into<Symbol>,
        options: &FetchOptions,
        continuation: F,
    ) -> Result<CallbackState, TypeMapError>
    where
        F: FnOnce(&EntityRef) + Send + 'static,
    {
        let key = key.into();
        let category = options.category.ensure_indexed()?;
        let lookup = options.without_fallback().suppress_registration();

        if let Some(entity) = self.fetch(key.clone(), &lookup)? {
            continuation(&entity);
            return Ok(CallbackState::Fired);
        }

        // No requested namespace means every namespace, exclusive or not.
        let mut namespaces = options.namespaces.clone();
        if (namespaces.is_empty() || !options.exclusive) && !namespaces.iter().any(Namespace::is_base) {
            namespaces.push(Namespace::base());
        }

        let state = self.state();
        let id = state.callbacks.push(key.clone(), category, namespaces, Box::new(continuation));

        // A registration may have landed between the lookup and the push.
        if let Some(entity) = self.fetch(key.clone(), &lookup)?
            && let Some(continuation) = state.callbacks.remove(&key, id)
        {
            continuation(&entity);
            return Ok(CallbackState::Fired);
        }

        trace!(%key, %category, "Callback queued");
        Ok(CallbackState::Queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Continuation {
        Box::new(|_| {})
    }

    #[test]
    fn records_fire_most_recent_first() {
        let registry = CallbackRegistry::default();
        let key = Symbol::from("color");
        let first = registry.push(key.clone(), Category::Type, vec![Namespace::base()], noop());
        let second = registry.push(key.clone(), Category::Type, vec![Namespace::base()], noop());
        assert!(first < second);

        let fired = registry.take_matching(&key, Category::Type, &[Namespace::from("mysql")]);
        assert_eq!(fired.len(), 2);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn records_require_matching_category_and_namespace() {
        let registry = CallbackRegistry::default();
        let key = Symbol::from("json");
        registry.push(key.clone(), Category::Type, vec![Namespace::from("mysql")], noop());

        assert!(registry.take_matching(&key, Category::Directive, &["mysql".into()]).is_empty());
        assert!(registry.take_matching(&key, Category::Type, &["pg".into()]).is_empty());
        assert_eq!(registry.take_matching(&key, Category::Type, &["mysql".into()]).len(), 1);
    }

    #[test]
    fn removed_records_do_not_fire() {
        let registry = CallbackRegistry::default();
        let key = Symbol::from("color");
        let id = registry.push(key.clone(), Category::Type, vec![Namespace::base()], noop());

        assert!(registry.remove(&key, id).is_some());
        assert!(registry.remove(&key, id).is_none());
        assert!(registry.take_matching(&key, Category::Type, &[Namespace::base()]).is_empty());
    }
}
