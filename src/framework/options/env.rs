//! Environment variable APIs (v0.25.4 onwards).

use std::collections::BTreeMap;

string_input!(SetEnvInputOptions for SetEnv { key => Key, value => Value });
mutator_output!(SetEnvOutputOptions for SetEnv);

string_input!(GetEnvInputOptions for GetEnv { key => Key });
payload_output!(GetEnvOutputOptions for GetEnv { value: String });

string_input!(DeleteEnvInputOptions for DeleteEnv { key => Key });
mutator_output!(DeleteEnvOutputOptions for DeleteEnv);

string_input!(GetEnvConfigurationsInputOptions for GetEnvConfigurations {});
payload_output!(GetEnvConfigurationsOutputOptions for GetEnvConfigurations {
    envs: BTreeMap<String, String>
});

command_factory!(new_set_env_command(SetEnvInputOptions, SetEnvOutputOptions));
command_factory!(new_get_env_command(GetEnvInputOptions, GetEnvOutputOptions));
command_factory!(new_delete_env_command(DeleteEnvInputOptions, DeleteEnvOutputOptions));
command_factory!(new_get_env_configurations_command(
    GetEnvConfigurationsInputOptions,
    GetEnvConfigurationsOutputOptions
));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::types::{ApiResult, ArgumentKey, RuntimeVersion};

    #[test]
    fn test_set_env_on_oldest_version_is_rejected() {
        let err = new_set_env_command(
            &SetEnvInputOptions {
                runtime_version: RuntimeVersion::V0116,
                key: "k".into(),
                value: "v".into(),
            },
            &SetEnvOutputOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "SetEnv API is not supported for the specified runtime version v0.11.6"
        );
    }

    #[test]
    fn test_get_env_is_not_available_on_oldest_version() {
        let err = new_get_env_command(
            &GetEnvInputOptions {
                runtime_version: RuntimeVersion::V0116,
                key: "k".into(),
            },
            &GetEnvOutputOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_construction());
    }

    #[test]
    fn test_set_env_requires_value() {
        let err = new_set_env_command(
            &SetEnvInputOptions {
                runtime_version: RuntimeVersion::Latest,
                key: "k".into(),
                value: " ".into(),
            },
            &SetEnvOutputOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid 'value' for SetEnvInputOptions for the specified runtime version latest"
        );
    }

    #[test]
    fn test_get_env_expectation() {
        let cmd = new_get_env_command(
            &GetEnvInputOptions {
                runtime_version: RuntimeVersion::V0280,
                key: "k".into(),
            },
            &GetEnvOutputOptions {
                runtime_version: RuntimeVersion::V0280,
                value: Some("v".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let api = &cmd.apis[0];
        assert_eq!(api.arguments[&ArgumentKey::Key], serde_yaml::Value::from("k"));
        let output = api.output.as_ref().unwrap();
        assert_eq!(output.result, ApiResult::Success);
        assert_eq!(output.content.trim(), "v");
    }

    #[test]
    fn test_empty_env_configurations_expectation() {
        let cmd = new_get_env_configurations_command(
            &GetEnvConfigurationsInputOptions {
                runtime_version: RuntimeVersion::V0254,
            },
            &GetEnvConfigurationsOutputOptions {
                runtime_version: RuntimeVersion::V0254,
                envs: Some(BTreeMap::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cmd.apis[0].output.as_ref().unwrap().content.trim(), "{}");
    }

    #[test]
    fn test_getter_without_expectation_has_no_output() {
        let cmd = new_get_env_command(
            &GetEnvInputOptions {
                runtime_version: RuntimeVersion::Latest,
                key: "k".into(),
            },
            &GetEnvOutputOptions::default(),
        )
        .unwrap();
        assert!(cmd.apis[0].output.is_none());
    }
}
