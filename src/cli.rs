//! Command-line interface for the site server binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Directory containing the site's source assets
    #[arg(short, long, default_value = "site", env = "KILN_ROOT")]
    pub root: PathBuf,

    /// Listen port
    #[arg(long, default_value = "8080", env = "KILN_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "KILN_BIND")]
    pub bind: String,

    /// Directory for persisted compiled-asset cache entries
    #[arg(long, default_value = ".kiln-cache", env = "KILN_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Render compiler diagnostics in error pages
    #[arg(long, env = "KILN_DEV")]
    pub dev: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
    Pretty,
}
