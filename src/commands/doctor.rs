use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::load_harness_config;
use crate::constants::HARNESS_CONFIG;
use crate::framework::types::RuntimeVersion;
use crate::framework::Runner;

pub fn run(plugins_dir: Option<PathBuf>) -> Result<()> {
    let cfg = load_harness_config(Path::new(HARNESS_CONFIG))?;
    let runner = Runner::new(cfg.plugins_dir(plugins_dir.as_deref()));
    println!("Plugins directory: {}", runner.plugins_dir().display());

    let mut missing = Vec::new();
    for version in RuntimeVersion::ALL {
        match runner.resolve_binary(version) {
            Ok(path) => println!("✅ {version}: {}", path.display()),
            Err(_) => {
                println!("❌ {version}: {} not found", version.plugin_binary_name());
                missing.push(version.as_str());
            }
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("missing plugin binaries for {}", missing.join(", "));
    }
    println!("✅ doctor checks passed");
    Ok(())
}
