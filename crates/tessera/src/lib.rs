//! Facade crate for Tessera.
//! Re-exports the type map, kernel config and logger, and wires them together.
//! Keep this crate thin: it composes other crates, it does not implement registry logic.
//!
//! ## Usage
//! ```rust
//! use tessera::kernel::config::TesseraConfig;
//! use tessera::typemap::{Definition, FetchOptions};
//!
//! let map = tessera::bootstrap(&TesseraConfig::default());
//! map.register(Definition::builder("int", "Int").build()).unwrap();
//! assert!(map.exists("int", &FetchOptions::new()).unwrap());
//! ```

pub use tessera_kernel as kernel;
#[cfg(feature = "logger")]
pub use tessera_logger as logger;
pub use tessera_typemap as typemap;

use std::sync::Arc;
use tessera_kernel::config::TesseraConfig;
use tessera_typemap::{SourceLoader, TypeMap};

/// Builds a shared type map from the `[typemap]` section of `config`.
#[must_use]
pub fn bootstrap(config: &TesseraConfig) -> Arc<TypeMap> {
    Arc::new(TypeMap::with_config(config.typemap.clone()))
}

/// [`bootstrap`] with a loader for `Dependency::Source` units.
#[must_use]
pub fn bootstrap_with_loader(config: &TesseraConfig, loader: Arc<dyn SourceLoader>) -> Arc<TypeMap> {
    Arc::new(TypeMap::with_config(config.typemap.clone()).with_source_loader(loader))
}

/// Installs the global subscriber described by the `[logging]` section of `config`.
///
/// # Errors
/// Returns [`logger::LoggerError`] for an unknown level, an invalid filter or when a
/// subscriber is already installed.
#[cfg(feature = "logger")]
pub fn init_logging(config: &TesseraConfig, name: &str) -> Result<logger::Logger, logger::LoggerError> {
    let settings = &config.logging;
    let level = logger::parse_level(&settings.level)?;

    let mut builder = logger::Logger::builder().name(name).level(level).console(settings.console);
    if let Some(filter) = &settings.env_filter {
        builder = builder.env_filter(filter.clone());
    }

    match &settings.directory {
        Some(directory) => builder.path(directory).json(settings.json).init(),
        None => builder.init(),
    }
}
