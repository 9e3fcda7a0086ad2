//! Error types for the compatibility harness
//!
//! Construction errors surface while a test case is assembled, dispatch
//! errors while plugins run, and validation errors when an observed log does
//! not match its expectation.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::framework::types::{RuntimeApiName, RuntimeVersion};

#[derive(Error, Debug)]
pub enum HarnessError {
    /// The API has no implementation in the requested edition.
    #[error("{api} API is not supported for the specified runtime version {version}")]
    UnsupportedApi {
        api: RuntimeApiName,
        version: RuntimeVersion,
    },

    /// A mandatory option field is missing for the requested edition.
    #[error("invalid '{field}' for {option} for the specified runtime version {version}")]
    InvalidOption {
        field: &'static str,
        option: String,
        version: RuntimeVersion,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        source: serde_yaml::Error,
    },

    #[error("invalid test case '{name}': {reason}")]
    InvalidTestCase { name: String, reason: String },

    #[error("plugin binary for version {0} not found")]
    PluginNotFound(RuntimeVersion),

    #[error("failed to write API script '{path}': {source}")]
    ScriptWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create shared configuration files: {0}")]
    Substrate(std::io::Error),

    #[error("failed to spawn plugin '{binary}': {source}")]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },

    #[error("plugin for version {version} exited with {status}: {stderr}")]
    PluginFailed {
        version: RuntimeVersion,
        status: String,
        stderr: String,
    },

    #[error("plugin for version {version} timed out after {timeout:?}")]
    Timeout {
        version: RuntimeVersion,
        timeout: Duration,
    },

    #[error("test case cancelled")]
    Cancelled,

    #[error("failed to parse log emitted by plugin {version}: {source}")]
    LogParse {
        version: RuntimeVersion,
        source: serde_yaml::Error,
    },

    #[error("no log entry for API #{index} ({api}) from plugin {version}")]
    MissingLog {
        index: usize,
        api: RuntimeApiName,
        version: RuntimeVersion,
    },

    #[error("plugin {version} emitted {count} unexpected log entries for {api}")]
    SurplusLog {
        api: RuntimeApiName,
        version: RuntimeVersion,
        count: usize,
    },

    #[error(
        "validation failed for API #{index} ({api} {version}): {reason}\nexpected:\n{expected}\nactual:\n{actual}"
    )]
    Validation {
        index: usize,
        api: RuntimeApiName,
        version: RuntimeVersion,
        reason: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl HarnessError {
    /// Construction errors are raised before anything is spawned.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            HarnessError::UnsupportedApi { .. }
                | HarnessError::InvalidOption { .. }
                | HarnessError::Serialize { .. }
                | HarnessError::InvalidTestCase { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
