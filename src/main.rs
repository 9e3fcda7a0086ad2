//! # runtime-compat
//!
//! Runs cross-version compatibility test cases against the
//! `runtime-test-plugin-*` binaries.
//!
//! ```bash
//! # Scaffold a sample test case
//! runtime-compat init
//!
//! # Check that every plugin binary is in place
//! runtime-compat doctor --plugins-dir target/debug
//!
//! # Run test cases
//! runtime-compat run compat-test.yaml --plugins-dir target/debug
//! ```
//!
//! Diagnostics are written to stderr; set `RUST_LOG=debug` for per-plugin
//! detail.

use anyhow::Result;
use clap::Parser;
use runtime_compat::{commands, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap_or_else(|| {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    });
    commands::run(cmd).await
}
