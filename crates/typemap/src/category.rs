use crate::error::TypeMapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The root kind of a registerable entity.
///
/// Only [`Type`](Category::Type), [`Directive`](Category::Directive) and
/// [`Schema`](Category::Schema) are stored in the index. A [`Source`](Category::Source)
/// owns generated entities but is never looked up by key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Type,
    Directive,
    Schema,
    Source,
}

impl Category {
    /// Categories stored in the namespace index, in slot order.
    pub const INDEXED: [Self; 3] = [Self::Type, Self::Directive, Self::Schema];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Directive => "Directive",
            Self::Schema => "Schema",
            Self::Source => "Source",
        }
    }

    #[must_use]
    pub const fn is_indexed(self) -> bool {
        self.slot().is_some()
    }

    pub(crate) const fn slot(self) -> Option<usize> {
        match self {
            Self::Type => Some(0),
            Self::Directive => Some(1),
            Self::Schema => Some(2),
            Self::Source => None,
        }
    }

    /// Returns `self` when the category can be stored in the index.
    ///
    /// # Errors
    /// Returns [`TypeMapError::UnsupportedCategory`] for [`Category::Source`].
    pub fn ensure_indexed(self) -> Result<Self, TypeMapError> {
        if self.is_indexed() {
            Ok(self)
        } else {
            Err(TypeMapError::UnsupportedCategory {
                message: self.as_str().into(),
                context: Some("category is not stored in the type map".into()),
            })
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TypeMapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "type" => Ok(Self::Type),
            "directive" => Ok(Self::Directive),
            "schema" => Ok(Self::Schema),
            "source" => Ok(Self::Source),
            _ => Err(TypeMapError::UnsupportedCategory {
                message: value.to_owned().into(),
                context: Some("expected one of Type, Directive, Schema, Source".into()),
            }),
        }
    }
}
