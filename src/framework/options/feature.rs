//! Feature flag APIs.

use serde_yaml::Value;

use super::{Check, InputOptions};
use crate::error::Result;
use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName, RuntimeVersion};

string_input!(SetFeatureInputOptions for SetFeature { plugin => Plugin, key => Key, value => Value });
mutator_output!(SetFeatureOutputOptions for SetFeature);

/// On v0.11.6 the flag is addressed by a single `plugin.feature` path: either
/// pass it whole in `key` or give `plugin` and `key` separately.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IsFeatureEnabledInputOptions {
    pub runtime_version: RuntimeVersion,
    pub plugin: String,
    pub key: String,
}

impl IsFeatureEnabledInputOptions {
    fn feature_path(&self) -> String {
        if self.plugin.is_empty() {
            self.key.clone()
        } else {
            format!("{}.{}", self.plugin, self.key)
        }
    }
}

impl InputOptions for IsFeatureEnabledInputOptions {
    const API: RuntimeApiName = RuntimeApiName::IsFeatureEnabled;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        check.require(!self.key.is_empty(), "key")?;
        if self.runtime_version == RuntimeVersion::V0116 {
            check.require(self.feature_path().contains('.'), "key")
        } else {
            check.require(!self.plugin.is_empty(), "plugin")
        }
    }

    fn arguments(&self) -> Result<Arguments> {
        let mut args = Arguments::new();
        if self.runtime_version == RuntimeVersion::V0116 {
            args.insert(ArgumentKey::Key, Value::from(self.feature_path()));
        } else {
            args.insert(ArgumentKey::Plugin, Value::from(self.plugin.clone()));
            args.insert(ArgumentKey::Key, Value::from(self.key.clone()));
        }
        Ok(args)
    }
}

payload_output!(IsFeatureEnabledOutputOptions for IsFeatureEnabled { enabled: bool });

string_input!(DeleteFeatureInputOptions for DeleteFeature { plugin => Plugin, key => Key });
mutator_output!(DeleteFeatureOutputOptions for DeleteFeature);

command_factory!(new_set_feature_command(SetFeatureInputOptions, SetFeatureOutputOptions));
command_factory!(new_is_feature_enabled_command(
    IsFeatureEnabledInputOptions,
    IsFeatureEnabledOutputOptions
));
command_factory!(new_delete_feature_command(DeleteFeatureInputOptions, DeleteFeatureOutputOptions));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_version_uses_dotted_path() {
        let input = IsFeatureEnabledInputOptions {
            runtime_version: RuntimeVersion::V0116,
            plugin: "plug".into(),
            key: "f".into(),
        };
        input.validate().unwrap();
        let args = input.arguments().unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args[&ArgumentKey::Key], Value::from("plug.f"));

        let dotted = IsFeatureEnabledInputOptions {
            runtime_version: RuntimeVersion::V0116,
            plugin: String::new(),
            key: "plug.f".into(),
        };
        assert_eq!(dotted.arguments().unwrap(), args);
    }

    #[test]
    fn test_oldest_version_rejects_undotted_key() {
        let input = IsFeatureEnabledInputOptions {
            runtime_version: RuntimeVersion::V0116,
            plugin: String::new(),
            key: "f".into(),
        };
        assert_eq!(
            input.validate().unwrap_err().to_string(),
            "invalid 'key' for IsFeatureEnabledInputOptions for the specified runtime version v0.11.6"
        );
    }

    #[test]
    fn test_newer_versions_need_plugin() {
        let input = IsFeatureEnabledInputOptions {
            runtime_version: RuntimeVersion::Latest,
            plugin: String::new(),
            key: "f".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_enabled_expectation_is_boolean() {
        let cmd = new_is_feature_enabled_command(
            &IsFeatureEnabledInputOptions {
                runtime_version: RuntimeVersion::Latest,
                plugin: "plug".into(),
                key: "f".into(),
            },
            &IsFeatureEnabledOutputOptions {
                runtime_version: RuntimeVersion::Latest,
                enabled: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cmd.apis[0].output.as_ref().unwrap().content.trim(), "true");
    }
}
