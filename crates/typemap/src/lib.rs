//! # Type Map
//!
//! A thread-safe registry of named, namespaced schema entities (types, directives and
//! schemas) with lazy resolution.
//!
//! ## Overview
//!
//! Entities are stored in a three-level index: namespace → category → symbol. The key of an
//! entity lives in its primary namespace; its display name, aliases and every further
//! namespace point back to that entry, so replacing the canonical entity is observed through
//! every alias on the next lookup.
//!
//! ## Features
//!
//! * **Namespaces**: lookups walk the requested namespaces and then `base`.
//! * **Aliases**: key aliases and resolver closures, evaluated on every access.
//! * **Deferred registration**: entities can be postponed until a lookup needs them.
//! * **Lazy dependencies**: per-namespace loaders that run on the first miss.
//! * **Callbacks**: continuations that fire once when a key becomes available.
//! * **Fallbacks**: substitute keys, reported once per missing key.
//! * **Concurrency**: `parking_lot` locks per bucket, no lock held while user code runs.
//!
//! # Example
//!
//! ```rust
//! use tessera_typemap::{Category, Definition, FetchOptions, TypeMap, TypeMapError};
//!
//! fn main() -> Result<(), TypeMapError> {
//!     let map = TypeMap::new();
//!     let color = map.register(Definition::builder("color", "Color").alias("colour").build())?;
//!
//!     let types = FetchOptions::new().category(Category::Type);
//!     assert_eq!(map.resolve("colour", &types)?.name(), "Color");
//!
//!     map.unregister(&[color])?;
//!     assert!(map.resolve("color", &types).unwrap_err().is_not_found());
//!     Ok(())
//! }
//! ```

mod callback;
mod category;
mod config;
mod dependency;
mod entity;
mod error;
mod ident;
mod index;
mod iter;
mod lookup;
mod map;
mod options;
mod pending;
mod register;
mod summary;
mod version;

pub use callback::{CallbackState, Continuation};
pub use category::Category;
pub use config::TypeMapConfig;
pub use dependency::{Dependency, SourceLoader};
pub use entity::{Definition, DefinitionBuilder, Entity, EntityRef, Registration};
pub use error::{TypeMapError, TypeMapErrorExt};
pub use ident::{Namespace, Symbol};
pub use index::{AliasPath, Resolver, Slot};
pub use iter::Entities;
pub use map::TypeMap;
pub use options::{FetchOptions, PreventRegister, Selection};
pub use register::AliasTarget;
pub use summary::Summary;
