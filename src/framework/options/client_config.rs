//! Whole-document client configuration APIs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{document, Check, ContextOpts, DiscoveryOpts, InputOptions, Payload, ServerOpts};
use crate::error::Result;
use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName, RuntimeVersion};
use crate::library::types::Target;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliOpts {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<DiscoveryOpts>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptionsOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliOpts>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigOpts {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_servers: Vec<ServerOpts>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_server: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_contexts: Vec<ContextOpts>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub current_context: BTreeMap<Target, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_options: Option<ClientOptionsOpts>,
}

impl Payload for ClientConfigOpts {
    fn check(&self, check: &Check) -> Result<()> {
        if check.version() == RuntimeVersion::V0116 {
            check.require(self.known_contexts.is_empty(), "clientConfig.knownContexts")?;
            check.require(self.current_context.is_empty(), "clientConfig.currentContext")?;
        }
        self.known_servers
            .iter()
            .try_for_each(|server| server.check(check))?;
        self.known_contexts
            .iter()
            .try_for_each(|context| context.check(check))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreClientConfigInputOptions {
    pub runtime_version: RuntimeVersion,
    pub client_config: ClientConfigOpts,
}

impl InputOptions for StoreClientConfigInputOptions {
    const API: RuntimeApiName = RuntimeApiName::StoreClientConfig;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        self.client_config.check(&check)
    }

    fn arguments(&self) -> Result<Arguments> {
        let mut args = Arguments::new();
        args.insert(
            ArgumentKey::ClientConfig,
            document("clientConfig", &self.client_config)?,
        );
        Ok(args)
    }
}

mutator_output!(StoreClientConfigOutputOptions for StoreClientConfig);

string_input!(GetClientConfigInputOptions for GetClientConfig {});
payload_output!(GetClientConfigOutputOptions for GetClientConfig { client_config: ClientConfigOpts });

command_factory!(new_store_client_config_command(
    StoreClientConfigInputOptions,
    StoreClientConfigOutputOptions
));
command_factory!(new_get_client_config_command(
    GetClientConfigInputOptions,
    GetClientConfigOutputOptions
));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::types::ServerType;

    #[test]
    fn test_store_client_config_document() {
        let config = ClientConfigOpts {
            known_servers: vec![ServerOpts {
                name: "s1".into(),
                server_type: Some(ServerType::Global),
                ..Default::default()
            }],
            current_server: "s1".into(),
            ..Default::default()
        };
        let cmd = new_store_client_config_command(
            &StoreClientConfigInputOptions {
                runtime_version: RuntimeVersion::V0116,
                client_config: config,
            },
            &StoreClientConfigOutputOptions {
                runtime_version: RuntimeVersion::V0116,
                ..Default::default()
            },
        )
        .unwrap();
        let doc = cmd.apis[0].arguments[&ArgumentKey::ClientConfig]
            .as_str()
            .unwrap();
        assert!(doc.contains("currentServer: s1"));
    }

    #[test]
    fn test_oldest_version_has_no_contexts() {
        let input = StoreClientConfigInputOptions {
            runtime_version: RuntimeVersion::V0116,
            client_config: ClientConfigOpts {
                known_contexts: vec![ContextOpts {
                    name: "c1".into(),
                    target: Some(Target::Kubernetes),
                    ..Default::default()
                }],
                ..Default::default()
            },
        };
        assert_eq!(
            input.validate().unwrap_err().to_string(),
            "invalid 'clientConfig.knownContexts' for StoreClientConfigInputOptions for the specified runtime version v0.11.6"
        );
    }
}
