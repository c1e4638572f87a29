use crate::category::Category;
use crate::entity::EntityRef;
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::index::Slot;
use crate::map::{State, TypeMap};
use crate::options::Selection;
use fxhash::FxHashSet;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::sync::Arc;
use std::vec;
use tracing::debug;

/// Lazy walk over the entities of a [`Selection`], created by [`TypeMap::each_from`].
///
/// Buckets are copied one at a time when the walk reaches them, so registrations made
/// while iterating may or may not be observed. Each display name is yielded once.
pub struct Entities<'a> {
    map: &'a TypeMap,
    state: Arc<State>,
    buckets: VecDeque<(Namespace, Category)>,
    current: vec::IntoIter<(Symbol, Slot)>,
    seen: FxHashSet<Box<str>>,
}

impl Iterator for Entities<'_> {
    type Item = EntityRef;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, slot)) = self.current.next() {
                if slot.is_tombstone() {
                    continue;
                }
                let Some(entity) = self.map.resolve_slot(&self.state, &slot, 0) else {
                    continue;
                };
                if self.seen.insert(entity.name().into()) {
                    return Some(entity);
                }
                continue;
            }

            let (namespace, category) = self.buckets.pop_front()?;
            self.current = self.state.index.snapshot(&namespace, category).unwrap_or_default().into_iter();
        }
    }
}

impl FusedIterator for Entities<'_> {}

impl std::fmt::Debug for Entities<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities")
            .field("remaining_buckets", &self.buckets.len())
            .field("yielded", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl TypeMap {
    /// Enumerates the entities registered under `selection`.
    ///
    /// Dependencies of the selected namespaces are loaded and pending registrations flushed
    /// before the walk starts.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed categories and
    /// propagates load and flush failures.
    ///
    /// # Example
    /// ```rust
    /// use tessera_typemap::{Definition, Selection, TypeMap};
    ///
    /// # fn main() -> Result<(), tessera_typemap::TypeMapError> {
    /// let map = TypeMap::new();
    /// map.register(Definition::builder("color", "Color").namespace("base").namespace("mysql").build())?;
    ///
    /// let names: Vec<_> = map.each_from(Selection::all())?.map(|e| e.name().to_owned()).collect();
    /// assert_eq!(names, ["Color"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn each_from(&self, selection: Selection) -> Result<Entities<'_>, TypeMapError> {
        let categories = if selection.categories.is_empty() {
            Category::INDEXED.to_vec()
        } else {
            selection.categories.iter().map(|c| c.ensure_indexed()).collect::<Result<_, _>>()?
        };

        let state = self.state();
        let namespaces = state.candidate_namespaces(&selection.namespaces, selection.exclusive);
        self.load_dependencies_in(&state, &namespaces)?;
        self.register_pending(&state)?;

        // Loading may have created namespaces.
        let namespaces = state.candidate_namespaces(&selection.namespaces, selection.exclusive);
        debug!(namespaces = namespaces.len(), categories = categories.len(), "Enumerating");
        let buckets = namespaces
            .iter()
            .flat_map(|namespace| categories.iter().map(move |&category| (namespace.clone(), category)))
            .collect();

        Ok(Entities {
            map: self,
            state,
            buckets,
            current: Vec::new().into_iter(),
            seen: FxHashSet::default(),
        })
    }
}
