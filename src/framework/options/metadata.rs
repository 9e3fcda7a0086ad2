//! Configuration metadata APIs (v0.90.0 onwards).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Payload;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMetadataOpts {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub patch_strategy: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, String>,
}

impl Payload for ConfigMetadataOpts {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_metadata: Option<ConfigMetadataOpts>,
}

impl Payload for MetadataOpts {}

string_input!(SetConfigMetadataSettingInputOptions for SetConfigMetadataSetting { key => Key, value => Value });
mutator_output!(SetConfigMetadataSettingOutputOptions for SetConfigMetadataSetting);

string_input!(GetConfigMetadataSettingInputOptions for GetConfigMetadataSetting { key => Key });
payload_output!(GetConfigMetadataSettingOutputOptions for GetConfigMetadataSetting { value: String });

string_input!(
    /// `value` is `replace` or `merge`; the plugin rejects anything else.
    SetConfigMetadataPatchStrategyInputOptions for SetConfigMetadataPatchStrategy { key => Key, value => Value }
);
mutator_output!(SetConfigMetadataPatchStrategyOutputOptions for SetConfigMetadataPatchStrategy);

string_input!(DeleteConfigMetadataSettingInputOptions for DeleteConfigMetadataSetting { key => Key });
mutator_output!(DeleteConfigMetadataSettingOutputOptions for DeleteConfigMetadataSetting);

string_input!(GetMetadataInputOptions for GetMetadata {});
payload_output!(GetMetadataOutputOptions for GetMetadata { metadata: MetadataOpts });

string_input!(GetConfigMetadataInputOptions for GetConfigMetadata {});
payload_output!(GetConfigMetadataOutputOptions for GetConfigMetadata {
    config_metadata: ConfigMetadataOpts
});

string_input!(GetConfigMetadataPatchStrategyInputOptions for GetConfigMetadataPatchStrategy {});
payload_output!(GetConfigMetadataPatchStrategyOutputOptions for GetConfigMetadataPatchStrategy {
    patch_strategy: BTreeMap<String, String>
});

string_input!(GetConfigMetadataSettingsInputOptions for GetConfigMetadataSettings {});
payload_output!(GetConfigMetadataSettingsOutputOptions for GetConfigMetadataSettings {
    settings: BTreeMap<String, String>
});

string_input!(IsConfigMetadataSettingsEnabledInputOptions for IsConfigMetadataSettingsEnabled { key => Key });
payload_output!(IsConfigMetadataSettingsEnabledOutputOptions for IsConfigMetadataSettingsEnabled {
    enabled: bool
});

string_input!(UseUnifiedConfigInputOptions for UseUnifiedConfig {});
payload_output!(UseUnifiedConfigOutputOptions for UseUnifiedConfig { enabled: bool });

command_factory!(new_set_config_metadata_setting_command(
    SetConfigMetadataSettingInputOptions,
    SetConfigMetadataSettingOutputOptions
));
command_factory!(new_get_config_metadata_setting_command(
    GetConfigMetadataSettingInputOptions,
    GetConfigMetadataSettingOutputOptions
));
command_factory!(new_set_config_metadata_patch_strategy_command(
    SetConfigMetadataPatchStrategyInputOptions,
    SetConfigMetadataPatchStrategyOutputOptions
));
command_factory!(new_delete_config_metadata_setting_command(
    DeleteConfigMetadataSettingInputOptions,
    DeleteConfigMetadataSettingOutputOptions
));
command_factory!(new_get_metadata_command(GetMetadataInputOptions, GetMetadataOutputOptions));
command_factory!(new_get_config_metadata_command(
    GetConfigMetadataInputOptions,
    GetConfigMetadataOutputOptions
));
command_factory!(new_get_config_metadata_patch_strategy_command(
    GetConfigMetadataPatchStrategyInputOptions,
    GetConfigMetadataPatchStrategyOutputOptions
));
command_factory!(new_get_config_metadata_settings_command(
    GetConfigMetadataSettingsInputOptions,
    GetConfigMetadataSettingsOutputOptions
));
command_factory!(new_is_config_metadata_settings_enabled_command(
    IsConfigMetadataSettingsEnabledInputOptions,
    IsConfigMetadataSettingsEnabledOutputOptions
));
command_factory!(new_use_unified_config_command(
    UseUnifiedConfigInputOptions,
    UseUnifiedConfigOutputOptions
));
