//! The three-level namespace index: namespace → category → symbol → [`Slot`].

use crate::category::Category;
use crate::entity::EntityRef;
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::map::TypeMap;
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A caller supplied lookup path, evaluated on every access.
pub type Resolver = Arc<dyn Fn(&TypeMap) -> Option<EntityRef> + Send + Sync>;

/// Where an alias slot points to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasPath {
    pub namespace: Namespace,
    pub category: Category,
    pub key: Symbol,
    /// When `false` the `base` namespace is also searched for the key.
    pub exclusive: bool,
}

/// Value stored under a (namespace, category, symbol) coordinate.
#[derive(Clone)]
pub enum Slot {
    Direct(EntityRef),
    Alias(AliasPath),
    Resolver(Resolver),
    /// Left behind by unregistration. Present, but resolves to nothing.
    Tombstone,
}

impl Slot {
    #[must_use]
    pub const fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(entity) => f.debug_tuple("Direct").field(&entity.key()).finish(),
            Self::Alias(target) => f.debug_tuple("Alias").field(target).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
            Self::Tombstone => f.write_str("Tombstone"),
        }
    }
}

type Items = IndexMap<Symbol, Slot, FxBuildHasher>;

/// One lock per indexed category so writers in different buckets never contend.
#[derive(Debug, Default)]
struct NamespaceEntry {
    buckets: [RwLock<Items>; Category::INDEXED.len()],
}

impl NamespaceEntry {
    fn bucket(&self, category: Category) -> Result<&RwLock<Items>, TypeMapError> {
        let slot = category.ensure_indexed()?.slot().unwrap_or_default();
        Ok(&self.buckets[slot])
    }
}

#[derive(Debug, Default)]
pub(crate) struct NamespaceIndex {
    namespaces: RwLock<IndexMap<Namespace, Arc<NamespaceEntry>, FxBuildHasher>>,
}

impl NamespaceIndex {
    pub(crate) fn get(
        &self,
        namespace: &Namespace,
        category: Category,
        key: &Symbol,
    ) -> Result<Option<Slot>, TypeMapError> {
        category.ensure_indexed()?;
        let Some(entry) = self.namespaces.read().get(namespace).cloned() else {
            return Ok(None);
        };
        let bucket = entry.bucket(category)?;
        Ok(bucket.read().get(key).cloned())
    }

    pub(crate) fn put(
        &self,
        namespace: &Namespace,
        category: Category,
        key: Symbol,
        slot: Slot,
    ) -> Result<(), TypeMapError> {
        category.ensure_indexed()?;
        let entry = self.entry(namespace);
        entry.bucket(category)?.write().insert(key, slot);
        Ok(())
    }

    /// Copies a single bucket so callers can resolve slots without holding any lock.
    pub(crate) fn snapshot(
        &self,
        namespace: &Namespace,
        category: Category,
    ) -> Result<Vec<(Symbol, Slot)>, TypeMapError> {
        category.ensure_indexed()?;
        let Some(entry) = self.namespaces.read().get(namespace).cloned() else {
            return Ok(Vec::new());
        };
        let items = entry.bucket(category)?.read();
        Ok(items.iter().map(|(key, slot)| (key.clone(), slot.clone())).collect())
    }

    /// Namespaces in creation order.
    pub(crate) fn namespaces(&self) -> Vec<Namespace> {
        self.namespaces.read().keys().cloned().collect()
    }

    pub(crate) fn namespace_count(&self) -> usize {
        self.namespaces.read().len()
    }

    fn entry(&self, namespace: &Namespace) -> Arc<NamespaceEntry> {
        if let Some(entry) = self.namespaces.read().get(namespace) {
            return Arc::clone(entry);
        }
        let mut namespaces = self.namespaces.write();
        Arc::clone(namespaces.entry(namespace.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Definition;

    #[test]
    fn put_then_get_round_trips_slots() {
        let index = NamespaceIndex::default();
        let base = Namespace::base();
        let color = Definition::builder("color", "Color").build();

        index.put(&base, Category::Type, Symbol::from("color"), Slot::Direct(color)).unwrap();

        assert!(matches!(
            index.get(&base, Category::Type, &Symbol::from("color")).unwrap(),
            Some(Slot::Direct(_))
        ));
        assert!(index.get(&base, Category::Directive, &Symbol::from("color")).unwrap().is_none());
        assert!(index.get(&Namespace::from("mysql"), Category::Type, &"color".into()).unwrap().is_none());
    }

    #[test]
    fn source_category_is_rejected() {
        let index = NamespaceIndex::default();
        let err = index
            .put(&Namespace::base(), Category::Source, Symbol::from("x"), Slot::Tombstone)
            .unwrap_err();
        assert!(matches!(err, TypeMapError::UnsupportedCategory { .. }));
        assert!(index.get(&Namespace::base(), Category::Source, &"x".into()).is_err());
    }

    #[test]
    fn namespaces_keep_creation_order() {
        let index = NamespaceIndex::default();
        for name in ["mysql", "base", "pg"] {
            index.put(&name.into(), Category::Type, "k".into(), Slot::Tombstone).unwrap();
        }
        let names: Vec<_> = index.namespaces().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["mysql", "base", "pg"]);
    }

    #[test]
    fn last_write_wins() {
        let index = NamespaceIndex::default();
        let base = Namespace::base();
        index.put(&base, Category::Type, "k".into(), Slot::Tombstone).unwrap();
        let entity = Definition::builder("k", "K").build();
        index.put(&base, Category::Type, "k".into(), Slot::Direct(entity)).unwrap();

        let snapshot = index.snapshot(&base, Category::Type).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot[0].1.is_tombstone());
    }
}
