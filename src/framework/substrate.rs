//! The three configuration files shared by every plugin process of a test
//! case. The harness only holds their paths; plugins find them through the
//! environment.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

use crate::constants::{TANZU_CONFIG, TANZU_CONFIG_METADATA, TANZU_CONFIG_NEXT_GEN};
use crate::library::ConfigPaths;

pub struct Substrate {
    paths: ConfigPaths,
    files: Vec<TempPath>,
}

fn empty_file(dir: &Path, prefix: &str) -> io::Result<TempPath> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".yaml")
        .tempfile_in(dir)
        .map(|file| file.into_temp_path())
}

impl Substrate {
    /// Creates three empty files in the system temp directory.
    pub fn create() -> io::Result<Self> {
        Substrate::create_in(&std::env::temp_dir())
    }

    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let config = empty_file(dir, "config-")?;
        let next_gen = empty_file(dir, "config-ng-")?;
        let metadata = empty_file(dir, "config-metadata-")?;
        let paths = ConfigPaths {
            config: config.to_path_buf(),
            next_gen: next_gen.to_path_buf(),
            metadata: metadata.to_path_buf(),
        };
        debug!(config = %paths.config.display(), "created configuration substrate");
        Ok(Substrate {
            paths,
            files: vec![config, next_gen, metadata],
        })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Variables pointing a child process at this substrate.
    pub fn env_vars(&self) -> [(&'static str, OsString); 3] {
        [
            (TANZU_CONFIG, self.paths.config.clone().into_os_string()),
            (TANZU_CONFIG_NEXT_GEN, self.paths.next_gen.clone().into_os_string()),
            (TANZU_CONFIG_METADATA, self.paths.metadata.clone().into_os_string()),
        ]
    }

    /// Removes the files. Safe to call repeatedly; files that are already
    /// gone are not an error.
    pub fn cleanup(&mut self) -> io::Result<()> {
        let mut first_error = None;
        for file in self.files.drain(..) {
            if let Err(e) = file.close() {
                if e.kind() != io::ErrorKind::NotFound && first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for Substrate {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("failed to remove configuration substrate: {e}");
        }
    }
}
