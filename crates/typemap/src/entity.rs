use crate::category::Category;
use crate::error::TypeMapError;
use crate::ident::{Namespace, Symbol};
use crate::map::TypeMap;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared handle to a registered entity.
pub type EntityRef = Arc<dyn Entity>;

/// Idempotent "already registered" flag carried by every entity.
#[derive(Debug, Default)]
pub struct Registration(AtomicBool);

impl Registration {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flips the flag on. Only the caller that observes the transition gets `true`.
    pub(crate) fn claim(&self) -> bool {
        self.0.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    /// Flips the flag off, returning whether it was set.
    pub(crate) fn release(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// The capability interface the type map requires from registerable definitions.
///
/// The registry never depends on concrete entity types: everything it needs to index,
/// alias, postpone and unregister an entity is exposed here.
pub trait Entity: Any + fmt::Debug + Send + Sync {
    /// Canonical symbolic key, unique within a namespace and category.
    fn key(&self) -> &Symbol;

    /// Human readable name, may differ from the key.
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Ordered namespaces, the first one is the primary.
    fn namespaces(&self) -> &[Namespace] {
        &[]
    }

    /// Additional names that resolve to this entity.
    fn aliases(&self) -> &[Symbol] {
        &[]
    }

    /// Path of the defining module (`a::b::c`), used to inherit an associated namespace.
    fn module_path(&self) -> Option<&str> {
        None
    }

    fn registration(&self) -> &Registration;

    fn is_registered(&self) -> bool {
        self.registration().is_registered()
    }

    /// Entity specific checks run before the entity is written into the index.
    ///
    /// # Errors
    /// Implementations return [`TypeMapError::Definition`] for invalid definitions.
    fn validate(&self, _map: &TypeMap) -> Result<(), TypeMapError> {
        Ok(())
    }

    /// Drains the child entities generated by and owned by this one.
    fn take_nested(&self) -> Vec<EntityRef> {
        Vec::new()
    }
}

type ValidateFn = dyn Fn(&Definition, &TypeMap) -> Result<(), TypeMapError> + Send + Sync;

#[derive(Clone)]
struct Validator(Arc<ValidateFn>);

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// A general purpose [`Entity`] implementation.
///
/// # Example
/// ```rust
/// use tessera_typemap::{Category, Definition, Entity};
///
/// let color = Definition::builder("color", "Color")
///     .category(Category::Type)
///     .alias("colour")
///     .build();
///
/// assert_eq!(color.key().as_str(), "color");
/// assert_eq!(color.aliases().len(), 1);
/// ```
#[derive(Debug)]
pub struct Definition {
    key: Symbol,
    name: Arc<str>,
    category: Category,
    namespaces: Vec<Namespace>,
    aliases: Vec<Symbol>,
    module_path: Option<Arc<str>>,
    registration: Registration,
    nested: Mutex<Vec<EntityRef>>,
    validator: Option<Validator>,
}

impl Definition {
    #[must_use]
    pub fn builder(key: impl Into<Symbol>, name: impl AsRef<str>) -> DefinitionBuilder {
        DefinitionBuilder {
            key: key.into(),
            name: Arc::from(name.as_ref()),
            category: Category::default(),
            namespaces: Vec::new(),
            aliases: Vec::new(),
            module_path: None,
            nested: Vec::new(),
            validator: None,
        }
    }

    /// Attaches a generated child entity, unregistered together with this one.
    pub fn adopt(&self, child: EntityRef) {
        self.nested.lock().push(child);
    }
}

impl Entity for Definition {
    fn key(&self) -> &Symbol {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Category {
        self.category
    }

    fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    fn aliases(&self) -> &[Symbol] {
        &self.aliases
    }

    fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    fn registration(&self) -> &Registration {
        &self.registration
    }

    fn validate(&self, map: &TypeMap) -> Result<(), TypeMapError> {
        self.validator.as_ref().map_or(Ok(()), |validator| (validator.0)(self, map))
    }

    fn take_nested(&self) -> Vec<EntityRef> {
        std::mem::take(&mut *self.nested.lock())
    }
}

/// Fluent builder for [`Definition`].
#[derive(Debug)]
pub struct DefinitionBuilder {
    key: Symbol,
    name: Arc<str>,
    category: Category,
    namespaces: Vec<Namespace>,
    aliases: Vec<Symbol>,
    module_path: Option<Arc<str>>,
    nested: Vec<EntityRef>,
    validator: Option<Validator>,
}

impl DefinitionBuilder {
    #[must_use = "Sets the category of the definition"]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Appends a namespace; the first one added becomes the primary namespace.
    #[must_use = "Adds a namespace to the definition"]
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    #[must_use = "Adds an alias to the definition"]
    pub fn alias(mut self, alias: impl Into<Symbol>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use = "Sets the defining module path"]
    pub fn module(mut self, path: impl AsRef<str>) -> Self {
        self.module_path = Some(Arc::from(path.as_ref()));
        self
    }

    #[must_use = "Adds an owned child entity"]
    pub fn nested(mut self, child: EntityRef) -> Self {
        self.nested.push(child);
        self
    }

    /// Installs a check run each time the definition is registered through
    /// [`TypeMap::define`] or a pending flush.
    #[must_use = "Sets the definition validator"]
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Definition, &TypeMap) -> Result<(), TypeMapError> + Send + Sync + 'static,
    {
        self.validator = Some(Validator(Arc::new(validator)));
        self
    }

    #[must_use]
    pub fn build(self) -> EntityRef {
        Arc::new(Definition {
            key: self.key,
            name: self.name,
            category: self.category,
            namespaces: self.namespaces,
            aliases: self.aliases,
            module_path: self.module_path,
            registration: Registration::new(),
            nested: Mutex::new(self.nested),
            validator: self.validator,
        })
    }
}
