//! The configuration library exercised by the plugin binaries.
//!
//! State lives in three YAML documents whose locations come from
//! `TANZU_CONFIG`, `TANZU_CONFIG_NEXT_GEN` and `TANZU_CONFIG_METADATA`. The
//! harness never reads them; only plugins do, through [`ConfigStore`].

use std::path::PathBuf;
use thiserror::Error;

pub mod store;
pub mod types;

pub use store::{ConfigPaths, ConfigStore};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("current {0} not found")]
    CurrentNotFound(&'static str),

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{0}")]
    Invalid(String),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
