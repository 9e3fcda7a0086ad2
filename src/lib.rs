//! # Plugin Runtime Compatibility Harness
//!
//! Checks that several editions of the configuration library, each built
//! into its own `runtime-test-plugin-<version>` binary, stay compatible when
//! they read and write the same configuration files.

use clap::Parser;

pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod framework;
pub mod library;
pub mod plugin;

/// Cross-version compatibility harness for the plugin runtime library
///
/// Test cases list API calls addressed to specific library versions. Each
/// group of calls is executed by that version's plugin binary against a
/// shared set of temporary configuration files, and every response is
/// checked against the declared expectation.
#[derive(Parser)]
#[command(
    name = "runtime-compat",
    version,
    about = "Cross-version API compatibility harness for the plugin runtime library",
    long_about = "Runs API scripts through per-version plugin binaries that share one set of configuration files,\nthen validates every response against the expectation declared in the test case."
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
