use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{save_harness_config, HarnessConfig};
use crate::constants::{HARNESS_CONFIG, PLUGINS_DIR_ENV, SAMPLE_TEST_CASE};
use crate::framework::options::context::*;
use crate::framework::options::{ContextOpts, GlobalServerOpts};
use crate::framework::types::RuntimeVersion;
use crate::framework::TestCase;
use crate::library::types::Target;

/// Context written by the newest edition and read back by an older one.
pub fn sample_test_case() -> crate::error::Result<TestCase> {
    let context = ContextOpts {
        name: "context-one".into(),
        target: Some(Target::Kubernetes),
        global_opts: Some(GlobalServerOpts {
            endpoint: "test-endpoint".into(),
        }),
        ..Default::default()
    };
    let set = new_set_context_command(
        &SetContextInputOptions {
            runtime_version: RuntimeVersion::Latest,
            context: context.clone(),
            is_current: false,
        },
        &SetContextOutputOptions::default(),
    )?;
    let mut get_cmds = Vec::new();
    for version in [RuntimeVersion::Latest, RuntimeVersion::V0280] {
        get_cmds.push(new_get_context_command(
            &GetContextInputOptions {
                runtime_version: version,
                context_name: context.name.clone(),
            },
            &GetContextOutputOptions {
                runtime_version: version,
                context: Some(context.clone()),
                ..Default::default()
            },
        )?);
    }
    Ok(TestCase::new("set-get-context").add(set).add_all(get_cmds))
}

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let target = path.unwrap_or_else(|| PathBuf::from(SAMPLE_TEST_CASE));
    if target.exists() {
        println!("Test case already exists at {}", target.display());
    } else {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, sample_test_case()?.to_yaml()?)?;
        println!("Created {}", target.display());
    }

    let cfg = Path::new(HARNESS_CONFIG);
    if !cfg.exists() {
        let harness = HarnessConfig {
            plugins_dir: Some(PathBuf::from(format!("${{{PLUGINS_DIR_ENV}:-./plugins}}"))),
            timeout_secs: Some(60),
            validation: None,
        };
        save_harness_config(cfg, &harness)?;
        println!("Created {}", cfg.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_case_is_valid() {
        let case = sample_test_case().unwrap();
        case.validate().unwrap();
        assert_eq!(case.commands.len(), 3);
        let yaml = case.to_yaml().unwrap();
        let parsed: TestCase = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, case);
    }
}
