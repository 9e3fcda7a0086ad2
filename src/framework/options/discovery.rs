//! CLI discovery source APIs (v0.28.0 onwards).

use super::{document, Check, DiscoveryOpts, InputOptions, Payload};
use crate::error::Result;
use crate::framework::types::{ArgumentKey, Arguments, RuntimeApiName, RuntimeVersion};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetCliDiscoverySourceInputOptions {
    pub runtime_version: RuntimeVersion,
    pub discovery_source: DiscoveryOpts,
}

impl InputOptions for SetCliDiscoverySourceInputOptions {
    const API: RuntimeApiName = RuntimeApiName::SetCliDiscoverySource;

    fn runtime_version(&self) -> RuntimeVersion {
        self.runtime_version
    }

    fn validate(&self) -> Result<()> {
        let check = Check::input(Self::API, self.runtime_version)?;
        self.discovery_source.check(&check)
    }

    fn arguments(&self) -> Result<Arguments> {
        let mut args = Arguments::new();
        args.insert(
            ArgumentKey::DiscoverySource,
            document("discoverySource", &self.discovery_source)?,
        );
        Ok(args)
    }
}

mutator_output!(SetCliDiscoverySourceOutputOptions for SetCliDiscoverySource);

string_input!(GetCliDiscoverySourceInputOptions for GetCliDiscoverySource { name => Name });
payload_output!(GetCliDiscoverySourceOutputOptions for GetCliDiscoverySource {
    discovery_source: DiscoveryOpts
});

string_input!(DeleteCliDiscoverySourceInputOptions for DeleteCliDiscoverySource { name => Name });
mutator_output!(DeleteCliDiscoverySourceOutputOptions for DeleteCliDiscoverySource);

command_factory!(new_set_cli_discovery_source_command(
    SetCliDiscoverySourceInputOptions,
    SetCliDiscoverySourceOutputOptions
));
command_factory!(new_get_cli_discovery_source_command(
    GetCliDiscoverySourceInputOptions,
    GetCliDiscoverySourceOutputOptions
));
command_factory!(new_delete_cli_discovery_source_command(
    DeleteCliDiscoverySourceInputOptions,
    DeleteCliDiscoverySourceOutputOptions
));

#[cfg(test)]
mod tests {
    use super::super::OciDiscoveryOpts;
    use super::*;

    fn oci(name: &str) -> DiscoveryOpts {
        DiscoveryOpts {
            oci: Some(OciDiscoveryOpts {
                name: name.into(),
                image: "registry.example.com/plugins:v1".into(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_set_discovery_source_document() {
        let cmd = new_set_cli_discovery_source_command(
            &SetCliDiscoverySourceInputOptions {
                runtime_version: RuntimeVersion::V0280,
                discovery_source: oci("default"),
            },
            &SetCliDiscoverySourceOutputOptions {
                runtime_version: RuntimeVersion::V0280,
                ..Default::default()
            },
        )
        .unwrap();
        let doc = cmd.apis[0].arguments[&ArgumentKey::DiscoverySource]
            .as_str()
            .unwrap();
        assert!(doc.contains("name: default"));
    }

    #[test]
    fn test_discovery_sources_need_v0_28() {
        let err = new_get_cli_discovery_source_command(
            &GetCliDiscoverySourceInputOptions {
                runtime_version: RuntimeVersion::V0254,
                name: "default".into(),
            },
            &GetCliDiscoverySourceOutputOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GetCLIDiscoverySource API is not supported for the specified runtime version v0.25.4"
        );
    }

    #[test]
    fn test_output_payload_is_validated() {
        let err = new_get_cli_discovery_source_command(
            &GetCliDiscoverySourceInputOptions {
                runtime_version: RuntimeVersion::Latest,
                name: "default".into(),
            },
            &GetCliDiscoverySourceOutputOptions {
                runtime_version: RuntimeVersion::Latest,
                discovery_source: Some(DiscoveryOpts::default()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid 'discoverySource.oci|local' for GetCLIDiscoverySourceOutputOptions for the specified runtime version latest"
        );
    }
}
