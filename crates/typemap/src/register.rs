use crate::entity::{Entity, EntityRef};
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::index::{AliasPath, Resolver, Slot};
use crate::map::TypeMap;
use crate::options::FetchOptions;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::trace;

/// What a name registered with [`TypeMap::register_alias`] resolves to.
#[derive(Clone)]
pub enum AliasTarget {
    /// Another key in the same namespace and category, followed on every lookup.
    Key(Symbol),
    /// A closure evaluated on every lookup.
    Resolver(Resolver),
}

impl AliasTarget {
    pub fn resolver<F>(resolve: F) -> Self
    where
        F: Fn(&TypeMap) -> Option<EntityRef> + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(resolve))
    }
}

impl std::fmt::Debug for AliasTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Name and aliases of an entity that differ from its key, without duplicates.
fn lookup_names(entity: &dyn Entity) -> Vec<Symbol> {
    let mut names: Vec<Symbol> = Vec::with_capacity(entity.aliases().len() + 1);
    let candidates = std::iter::once(Symbol::from(entity.name())).chain(entity.aliases().iter().cloned());
    for name in candidates {
        if &name != entity.key() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

impl TypeMap {
    /// Writes `entity` into the index and fires the callbacks waiting for it.
    ///
    /// The key is stored in the primary namespace, the name and aliases point to it, and
    /// every further namespace receives the key, name and aliases as aliases of the primary
    /// entry. Registering an entity twice is a no-op. An entity of another kind already
    /// stored under the same key is silently replaced; use [`TypeMap::define`] to reject it.
    ///
    /// # Errors
    /// Fails only when the index rejects the entity's category.
    pub fn register(&self, entity: EntityRef) -> Result<EntityRef, TypeMapError> {
        let category = entity.category();
        if !category.is_indexed() {
            if entity.registration().claim() {
                trace!(key = %entity.key(), %category, "Registered unindexed entity");
            }
            return Ok(entity);
        }
        if !entity.registration().claim() {
            return Ok(entity);
        }

        let state = self.state();
        let namespaces = state.namespaces_of(entity.as_ref());
        let key = entity.key().clone();
        let names = lookup_names(entity.as_ref());
        let (primary, others) = namespaces.split_first().ok_or_else(|| TypeMapError::Internal {
            message: "entity resolved to no namespace".into(),
            context: Some(key.to_string().into()),
        })?;

        let alias = Slot::Alias(AliasPath {
            namespace: primary.clone(),
            category,
            key: key.clone(),
            exclusive: true,
        });
        state.index.put(primary, category, key.clone(), Slot::Direct(Arc::clone(&entity)))?;
        for name in &names {
            state.index.put(primary, category, name.clone(), alias.clone())?;
        }
        for namespace in others {
            for symbol in std::iter::once(&key).chain(&names) {
                state.index.put(namespace, category, symbol.clone(), alias.clone())?;
            }
        }
        trace!(%key, %category, namespace = %primary, "Registered");

        for symbol in std::iter::once(&key).chain(&names) {
            for continuation in state.callbacks.take_matching(symbol, category, &namespaces) {
                continuation(&entity);
            }
        }

        state.objects.fetch_add(1, Ordering::AcqRel);
        Ok(entity)
    }

    /// Runs the entity's own validation, then [`TypeMap::register`]s it.
    ///
    /// # Errors
    /// Propagates [`Entity::validate`] failures.
    pub fn register_entity(&self, entity: EntityRef) -> Result<EntityRef, TypeMapError> {
        if entity.is_registered() {
            return Ok(entity);
        }
        entity.validate(self)?;
        self.register(entity)
    }

    /// Registers `entity` unless its key is already held by another entity in its primary
    /// namespace.
    ///
    /// # Errors
    /// Returns [`TypeMapError::DuplicateDefinition`] for a taken key, or the validation error
    /// of the entity.
    pub fn define(&self, entity: EntityRef) -> Result<EntityRef, TypeMapError> {
        let category = entity.category();
        if category.is_indexed() {
            let state = self.state();
            let namespaces = state.namespaces_of(entity.as_ref());
            let primary = namespaces.first().cloned().unwrap_or_else(Namespace::base);
            if let Some(Slot::Direct(existing)) = state.index.get(&primary, category, entity.key())?
                && !Arc::ptr_eq(&existing, &entity)
            {
                return Err(TypeMapError::DuplicateDefinition {
                    key: entity.key().clone(),
                    category,
                    namespace: primary,
                    context: None,
                });
            }
        }
        self.register_entity(entity)
    }

    /// Removes entities from the index, leaving a tombstone under each primary key, and
    /// recursively unregisters the children they own.
    ///
    /// Unregistered entities can be registered again.
    ///
    /// # Errors
    /// Fails only when the index rejects a category.
    pub fn unregister(&self, entities: &[EntityRef]) -> Result<(), TypeMapError> {
        let state = self.state();
        for entity in entities {
            let nested = entity.take_nested();
            if !nested.is_empty() {
                self.unregister(&nested)?;
            }

            let category = entity.category();
            let was_registered = entity.registration().release();
            if !category.is_indexed() {
                continue;
            }

            let namespaces = state.namespaces_of(entity.as_ref());
            if let Some(primary) = namespaces.first() {
                state.index.put(primary, category, entity.key().clone(), Slot::Tombstone)?;
            }
            if was_registered {
                let _ = state.objects.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                    n.checked_sub(1)
                });
            }
            trace!(key = %entity.key(), %category, "Unregistered");
        }
        Ok(())
    }

    /// Adds `name` as another lookup path to `target` in the category and namespaces of
    /// `options` (`base` when none are given).
    ///
    /// Key targets are followed at lookup time, so they may be registered before the target
    /// exists. Unless `options` are exclusive, a key target missing from the alias namespace
    /// is also searched in `base`.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for non indexed categories.
    pub fn register_alias(
        &self,
        name: impl Into<Symbol>,
        target: AliasTarget,
        options: &FetchOptions,
    ) -> Result<(), TypeMapError> {
        let name = name.into();
        let category = options.category.ensure_indexed()?;
        let state = self.state();
        let namespaces = match options.namespaces.as_slice() {
            [] => vec![Namespace::base()],
            selected => selected.to_vec(),
        };

        for namespace in namespaces {
            let slot = match &target {
                AliasTarget::Key(key) => Slot::Alias(AliasPath {
                    namespace: namespace.clone(),
                    category,
                    key: key.clone(),
                    exclusive: options.exclusive,
                }),
                AliasTarget::Resolver(resolver) => Slot::Resolver(Arc::clone(resolver)),
            };
            trace!(alias = %name, target = ?target, %namespace, "Alias registered");
            state.index.put(&namespace, category, name.clone(), slot)?;
        }
        Ok(())
    }

    /// [`TypeMap::register_alias`] taking the target as two optional parts.
    ///
    /// # Errors
    /// Returns [`TypeMapError::InvalidArgument`] unless exactly one of `key` and `resolver`
    /// is given.
    pub fn register_alias_with(
        &self,
        name: impl Into<Symbol>,
        key: Option<Symbol>,
        resolver: Option<Resolver>,
        options: &FetchOptions,
    ) -> Result<(), TypeMapError> {
        let target = match (key, resolver) {
            (Some(key), None) => AliasTarget::Key(key),
            (None, Some(resolver)) => AliasTarget::Resolver(resolver),
            (Some(_), Some(_)) => {
                return Err(TypeMapError::InvalidArgument {
                    message: "alias takes either a target key or a resolver, not both".into(),
                    context: None,
                });
            },
            (None, None) => {
                return Err(TypeMapError::InvalidArgument {
                    message: "alias requires a target key or a resolver".into(),
                    context: None,
                });
            },
        };
        self.register_alias(name, target, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Definition;

    #[test]
    fn lookup_names_skip_the_key_and_duplicates() {
        let entity = Definition::builder("color", "Color").alias("colour").alias("Color").build();
        let names: Vec<_> = lookup_names(entity.as_ref()).iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Color", "colour"]);

        let same = Definition::builder("Int", "Int").build();
        assert!(lookup_names(same.as_ref()).is_empty());
    }
}
