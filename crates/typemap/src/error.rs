use crate::category::Category;
use crate::ident::{Namespace, Symbol};
use std::borrow::Cow;

/// Errors raised by [`TypeMap`](crate::TypeMap) operations.
#[tessera_derive::tessera_error]
pub enum TypeMapError {
    /// A read or write targeted a category that is not stored in the index.
    #[error("Unsupported category{}: {message}", format_context(.context))]
    UnsupportedCategory { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Malformed call, e.g. an alias registered with both or neither of a key and a resolver.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Lookup exhausted every namespace, dependency and fallback.
    #[error("Unable to find {category} `{key}`{}", format_context(.context))]
    NotFound { key: Symbol, category: Category, context: Option<Cow<'static, str>> },

    /// The key is already taken by another entity in the same namespace and category.
    #[error("Duplicate definition{}: {category} `{key}` already exists in `{namespace}`", format_context(.context))]
    DuplicateDefinition {
        key: Symbol,
        category: Category,
        namespace: Namespace,
        context: Option<Cow<'static, str>>,
    },

    /// Raised by an entity's own registration logic.
    #[error("Definition error{}: {message}", format_context(.context))]
    Definition { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A queued dependency could not be loaded.
    #[error("Dependency load failed{}: {message}", format_context(.context))]
    LoadFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal type map error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl TypeMapError {
    /// Shorthand for a [`TypeMapError::Definition`] without context.
    pub fn definition(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Definition { message: message.into(), context: None }
    }

    /// Returns `true` for [`TypeMapError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
