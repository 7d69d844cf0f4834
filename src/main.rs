//! Shim binary that calls into the `kiln` library's `inner_main`.
use clap::Parser as _;
use eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Delegate to library entrypoint
    kiln::inner_main(kiln::cli::Cli::parse()).await
}
