//! Harness configuration (`runtimecompat.yaml`)
//!
//! ```yaml
//! pluginsDir: ${RUNTIME_TEST_PLUGINS_DIR:-./plugins}
//! timeoutSecs: 60
//! validation: partial
//! ```
//!
//! ## Environment Variable Expansion
//!
//! The file supports environment variable expansion with the following syntax:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::constants::{DEFAULT_PLUGINS_DIR, PLUGINS_DIR_ENV};
use crate::framework::types::ValidationStrategy;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    /// Directory holding the `runtime-test-plugin-*` binaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins_dir: Option<PathBuf>,
    /// Deadline for each plugin process; `0` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// `exact` forces exact test-case validation for every run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStrategy>,
}

impl HarnessConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// `--plugins-dir` flag, then `RUNTIME_TEST_PLUGINS_DIR`, then the file,
    /// then `./plugins`.
    pub fn plugins_dir(&self, flag: Option<&Path>) -> PathBuf {
        resolve_plugins_dir(
            flag,
            env::var(PLUGINS_DIR_ENV).ok().as_deref(),
            self.plugins_dir.as_deref(),
        )
    }
}

fn resolve_plugins_dir(flag: Option<&Path>, env_dir: Option<&str>, file: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| env_dir.filter(|d| !d.is_empty()).map(PathBuf::from))
        .or_else(|| {
            file.filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGINS_DIR))
}

/// Missing or empty files yield the defaults.
pub fn load_harness_config(path: &Path) -> anyhow::Result<HarnessConfig> {
    if !path.exists() {
        return Ok(HarnessConfig::default());
    }
    let data = preprocess_config(path)?;
    if data.trim().is_empty() {
        return Ok(HarnessConfig::default());
    }
    let cfg: HarnessConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing harness config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_harness_config(path: &Path, cfg: &HarnessConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn expand_env_placeholders(input: &str) -> anyhow::Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = env::var(&caps[1]).ok();
        let op = caps.get(2).map_or("", |m| m.as_str());
        let alt = caps.get(3).map_or("", |m| m.as_str());

        match (var.as_deref(), op) {
            (Some(v), "") => v.to_string(),
            (Some(v), ":-") if !v.is_empty() => v.to_string(),
            (_, ":-") => alt.to_string(),
            (Some(v), "-") => v.to_string(),
            (None, "-") => alt.to_string(),
            (Some(v), ":+") if !v.is_empty() => alt.to_string(),
            (Some(_), "+") => alt.to_string(),
            _ => String::new(),
        }
    });
    Ok(expanded.into_owned())
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw_data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    expand_env_placeholders(&raw_data)
}
