//! Backdrop Studio CLI Tool
//!
//! Command-line interface for replacing photo backgrounds with stock imagery
//! and exporting the result for social-media layouts.

#[cfg(feature = "cli")]
use backdrop_studio::cli;

#[cfg(feature = "cli")]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
