use crate::ident::Namespace;
use serde::Serialize;
use std::fmt;

/// Point-in-time counters of a [`TypeMap`](crate::TypeMap), for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub version: String,
    pub namespaces: usize,
    pub categories: usize,
    pub objects: usize,
    pub pending: usize,
    pub callbacks: usize,
    /// Units still queued, per namespace that ever had dependencies.
    pub dependencies: Vec<(Namespace, usize)>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<TypeMap [{}] @namespaces={} @categories={} @objects={} @pending={} @callbacks={} @dependencies={{",
            self.version, self.namespaces, self.categories, self.objects, self.pending, self.callbacks,
        )?;
        for (position, (namespace, count)) in self.dependencies.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{namespace}: {count}")?;
        }
        f.write_str("}>")
    }
}
