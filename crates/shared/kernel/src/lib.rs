//! Kernel utilities shared across Tessera applications.
//! Keep this crate lightweight; it only hosts the configuration model and its loader.
//!
//! ## Config loading
//! ```rust,no_run
//! use tessera_kernel::config::{TesseraConfig, load_config};
//!
//! let config: TesseraConfig = load_config(Some("config/tessera.toml")).unwrap();
//! assert!(config.typemap.max_alias_depth > 0);
//! ```
pub mod config;

pub use tessera_typemap::TypeMapConfig;
