//! Well-known names shared by the harness and the plugin binaries.

/// Harness configuration file looked up in the working directory.
pub const HARNESS_CONFIG: &str = "runtimecompat.yaml";

/// Sample test case written by `runtime-compat init`.
pub const SAMPLE_TEST_CASE: &str = "compat-test.yaml";

/// Directory holding the per-version plugin binaries.
pub const PLUGINS_DIR_ENV: &str = "RUNTIME_TEST_PLUGINS_DIR";
pub const DEFAULT_PLUGINS_DIR: &str = "./plugins";

/// Prefix of every plugin binary; the version follows with `.` mapped to `_`.
pub const PLUGIN_BINARY_PREFIX: &str = "runtime-test-plugin-";

// Substrate locations exported to every plugin process.
pub const TANZU_CONFIG: &str = "TANZU_CONFIG";
pub const TANZU_CONFIG_NEXT_GEN: &str = "TANZU_CONFIG_NEXT_GEN";
pub const TANZU_CONFIG_METADATA: &str = "TANZU_CONFIG_METADATA";

/// Optional CLI path forwarded untouched to children.
pub const TANZU_BIN: &str = "TANZU_BIN";

// TTY suppression applied to every child.
pub const TANZU_CLI_NO_COLOR: &str = "TANZU_CLI_NO_COLOR";
pub const NO_COLOR: &str = "NO_COLOR";
pub const TERM: &str = "TERM";

// Fallback file names under `~/.config/tanzu` when a variable is unset.
pub const CONFIG_FILE: &str = "config.yaml";
pub const CONFIG_NEXT_GEN_FILE: &str = "config-ng.yaml";
pub const CONFIG_METADATA_FILE: &str = ".config-metadata.yaml";
pub const CONFIG_HOME_DIR: &str = "tanzu";
