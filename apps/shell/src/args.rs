//! # CLI Argument Definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tessera::typemap::{Category, FetchOptions, Selection};

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "tessera")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect a namespaced type registry")]
pub struct Cli {
    /// Configuration file (defaults to an optional `tessera.toml` in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Load a TOML manifest lazily into a namespace, as `namespace=path`
    #[arg(short, long = "manifest", global = true, value_parser = parse_manifest)]
    pub manifests: Vec<(String, PathBuf)>,

    /// Skip the built-in demo catalog
    #[arg(long, global = true)]
    pub bare: bool,

    #[arg(short, long, global = true, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the registry summary
    Summary,
    /// Enumerate registered entities
    List(ListArgs),
    /// Resolve a key, name or alias
    Lookup(LookupArgs),
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Namespaces to walk (all when omitted)
    #[arg(short, long = "namespace")]
    pub namespaces: Vec<String>,

    /// Categories to walk (type, directive, schema)
    #[arg(short = 't', long = "category", value_parser = parse_category)]
    pub categories: Vec<Category>,

    /// Do not fall back to `base`
    #[arg(long)]
    pub exclusive: bool,
}

#[derive(Debug, clap::Args)]
pub struct LookupArgs {
    pub key: String,

    #[arg(short, long = "namespace")]
    pub namespaces: Vec<String>,

    #[arg(short = 't', long, value_parser = parse_category, default_value = "type")]
    pub category: Category,

    /// Key substituted when `key` is missing
    #[arg(long)]
    pub fallback: Option<String>,

    #[arg(long)]
    pub exclusive: bool,
}

impl ListArgs {
    #[must_use]
    pub fn selection(&self) -> Selection {
        let selection = self.namespaces.iter().fold(Selection::all(), |s, ns| s.namespace(ns.as_str()));
        self.categories.iter().fold(selection, |s, category| s.category(*category)).exclusive(self.exclusive)
    }
}

impl LookupArgs {
    #[must_use]
    pub fn options(&self) -> FetchOptions {
        let mut options = FetchOptions::new()
            .category(self.category)
            .namespaces(self.namespaces.iter().map(String::as_str))
            .exclusive(self.exclusive);
        if let Some(fallback) = &self.fallback {
            options = options.fallback(fallback.as_str());
        }
        options
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse().map_err(|err: tessera::typemap::TypeMapError| err.to_string())
}

fn parse_manifest(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((namespace, path)) if !namespace.trim().is_empty() && !path.is_empty() => {
            Ok((namespace.trim().to_owned(), PathBuf::from(path)))
        },
        _ => Err(format!("expected `namespace=path`, got `{value}`")),
    }
}
