use serde::{Deserialize, Serialize};

/// Tunables of a [`TypeMap`](crate::TypeMap).
///
/// Deserialized from the `[typemap]` table of the application configuration; every field is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMapConfig {
    /// Cache-busting token exposed by [`TypeMap::version`](crate::TypeMap::version).
    /// Truncated to 8 characters. Generated when missing.
    pub version: Option<String>,
    /// Upper bound on chained alias hops before a lookup gives up.
    pub max_alias_depth: usize,
    /// Emit a warning the first time a fallback key replaces a missing one.
    pub report_fallbacks: bool,
}

impl Default for TypeMapConfig {
    fn default() -> Self {
        Self { version: None, max_alias_depth: 8, report_fallbacks: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: TypeMapConfig = serde_json::from_str(r#"{ "version": "abc" }"#).unwrap();
        assert_eq!(config.version.as_deref(), Some("abc"));
        assert_eq!(config.max_alias_depth, 8);
        assert!(config.report_fallbacks);
    }
}
