use crate::category::Category;
use crate::entity::EntityRef;
use crate::ident::{Namespace, Symbol};

/// Whether a lookup may flush pending registrations first.
#[derive(Debug, Clone, Default)]
pub enum PreventRegister {
    /// Flush the pending queue before searching.
    #[default]
    Flush,
    /// Never flush. Used by existence checks and by resolvers that call back into the map.
    Suppress,
    /// Flush, but re-queue the listed entities instead of registering them.
    Skip(Vec<EntityRef>),
}

/// Options for [`TypeMap::fetch`](crate::TypeMap::fetch) and friends.
///
/// # Example
/// ```rust
/// use tessera_typemap::{Category, FetchOptions};
///
/// let options = FetchOptions::new()
///     .category(Category::Directive)
///     .namespace("mysql")
///     .exclusive(true);
///
/// assert_eq!(options.selected_namespaces().len(), 1);
/// assert_eq!(options.selected_category(), Category::Directive);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub(crate) category: Category,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) exclusive: bool,
    pub(crate) fallback: Option<Symbol>,
    pub(crate) prevent_register: PreventRegister,
}

impl FetchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Adds a namespace to search. Without any, every known namespace is searched.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        let namespace = namespace.into();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    #[must_use]
    pub fn namespaces<I, N>(self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Namespace>,
    {
        namespaces.into_iter().fold(self, |options, namespace| options.namespace(namespace))
    }

    /// Excludes the implicit `base` namespace from the search.
    #[must_use]
    pub const fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Key substituted when the requested one cannot be found.
    #[must_use]
    pub fn fallback(mut self, fallback: impl Into<Symbol>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    #[must_use]
    pub fn prevent_register(mut self, prevent: PreventRegister) -> Self {
        self.prevent_register = prevent;
        self
    }

    /// Shorthand for [`PreventRegister::Suppress`].
    #[must_use]
    pub fn suppress_registration(self) -> Self {
        self.prevent_register(PreventRegister::Suppress)
    }

    /// Adds `entity` to the [`PreventRegister::Skip`] set.
    #[must_use]
    pub fn skip_registration_of(mut self, entity: EntityRef) -> Self {
        if let PreventRegister::Skip(set) = &mut self.prevent_register {
            set.push(entity);
        } else {
            self.prevent_register = PreventRegister::Skip(vec![entity]);
        }
        self
    }

    #[must_use]
    pub const fn selected_category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn selected_namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub(crate) fn without_fallback(&self) -> Self {
        Self { fallback: None, ..self.clone() }
    }
}

/// Namespaces and categories walked by [`TypeMap::each_from`](crate::TypeMap::each_from).
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) categories: Vec<Category>,
    pub(crate) exclusive: bool,
}

impl Selection {
    /// Every namespace and every indexed category.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        let namespace = namespace.into();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    #[must_use]
    pub const fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }
}
