//! Harness side: build test cases, run them through the plugin binaries and
//! check what they log.

pub mod options;
pub mod runner;
pub mod substrate;
pub mod test_case;
pub mod types;
pub mod validator;

pub use runner::{PluginInvocation, Runner, TestCaseOutcome};
pub use test_case::{Command, TestCase};
