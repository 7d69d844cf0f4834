//! Embedded HTTP serving layer.
//!
//! Turns an arbitrary route outcome (string, bytes, JSON value, stream,
//! optional, redirect, file) into a correctly-negotiated, cache-validated
//! HTTP response, and serves on-disk source assets (scripts, stylesheets,
//! markup) as compiled output without recompiling on every request.
//!
//! Exposes `inner_main` so the shim binary can call into the server logic.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

pub mod cli;
pub mod compile;
pub mod error;
pub mod payload;
pub mod request;
pub mod resources;
pub mod response;
pub mod server;
pub mod site;

pub use payload::Payload;
pub use request::Request;
pub use site::Site;

use std::sync::Once;

use eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, LogFormat};
use server::{RouteSet, SiteServer};

static INIT_TRACING: Once = Once::new();

/// The server's main function; can be called from a shim binary.
///
/// Sets up logging and serves the configured site directory until the
/// process is stopped.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server loop fails.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    let log_format = invocation.log_format;
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_timer(ChronoLocal::rfc_3339());

        match log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });

    info!(
        root = %invocation.root.display(),
        cache_dir = %invocation.cache_dir.display(),
        dev = invocation.dev,
        version = env!("CARGO_PKG_VERSION"),
        "starting site server"
    );

    let site = Site::new(&invocation.root, &invocation.cache_dir).with_dev_mode(invocation.dev);
    let server = SiteServer::new(site, RouteSet::new());
    server::serve(server, &invocation.bind, invocation.port).await
}
