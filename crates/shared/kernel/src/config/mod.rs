mod settings;

pub use settings::{LoggingConfig, TesseraConfig, TesseraConfigInner};

use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `TESSERA__TYPEMAP__MAX_ALIAS_DEPTH`.
pub const ENV_PREFIX: &str = "TESSERA";

/// Configuration file looked up when no path is given (any supported extension).
pub const DEFAULT_CONFIG_FILE: &str = "tessera";

/// Custom error type for config loading.
#[tessera_derive::tessera_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration structure from a file overlaid with environment overrides.
///
/// Layers, lowest priority first:
/// 1. **Base File**: the given path, required to exist. Without a path the optional
///    `tessera.{toml,yaml,json,...}` file in the working directory is used.
/// 2. **Environment Overrides**: variables prefixed with `TESSERA__`. Nested structures are
///    separated by double underscores (`TESSERA__LOGGING__LEVEL` maps to `logging.level`).
///
/// # Errors
/// Returns [`ConfigError::Config`] when an explicit file is missing or the merged values do
/// not match `T`.
///
/// # Example
/// ```rust
/// use tessera_kernel::config::{TesseraConfig, load_config};
///
/// let config: TesseraConfig = load_config(None::<&str>).unwrap_or_default();
/// assert_eq!(config.typemap.max_alias_depth, 8);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layers(path, Environment::with_prefix(ENV_PREFIX))
}

/// [`load_config`] reading the overrides from `vars` instead of the process environment.
///
/// # Errors
/// Same as [`load_config`].
pub fn load_config_with_env<T, I>(path: Option<impl AsRef<Path>>, vars: I) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Map<String, String> = vars.into_iter().collect();
    load_layers(path, Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
}

fn load_layers<T>(path: Option<impl AsRef<Path>>, environment: Environment) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            environment.separator("__").try_parsing(true), // Env var overrides (e.g., TESSERA__LOGGING__LEVEL)
        );

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
