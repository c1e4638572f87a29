use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use tessera_typemap::TypeMapConfig;

/// Top-level configuration shared by Tessera applications.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TesseraConfigInner {
    pub typemap: TypeMapConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct TesseraConfig {
    #[serde(flatten, default)]
    inner: Arc<TesseraConfigInner>,
}

impl Deref for TesseraConfig {
    type Target = TesseraConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for TesseraConfig {
    fn deref_mut(&mut self) -> &mut TesseraConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Logger settings, mapped onto the logger builder by applications.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    pub console: bool,
    /// Directory of rolling log files. File logging is off when unset.
    pub directory: Option<PathBuf>,
    pub json: bool,
    /// Extra `EnvFilter` directives, e.g. `"tessera_typemap=trace"`.
    pub env_filter: Option<String>,
}

// --- Default ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), console: true, directory: None, json: false, env_filter: None }
    }
}
