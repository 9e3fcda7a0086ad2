//! Per-API option records and the command factory.
//!
//! Every API has an input record (what to call it with) and an output record
//! (what to expect back). Both carry the runtime version and validate against
//! it, so a script that asks an edition for something it cannot do fails at
//! assembly time instead of halfway through a cross-binary run.
//!
//! Factories (`new_<api>_command`) validate the input, serialize arguments,
//! derive the expected [`Output`] and wrap the result in a [`Command`].

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

use crate::error::{HarnessError, Result};
use crate::framework::test_case::Command;
use crate::framework::types::{
    Api, ApiResult, Arguments, Output, RuntimeApiName, RuntimeVersion, ValidationStrategy,
};
use crate::library::types::{ContextType, ServerType, Target};

/// Field checks for one option record against one edition.
pub struct Check {
    option: String,
    version: RuntimeVersion,
}

impl Check {
    pub fn input(api: RuntimeApiName, version: RuntimeVersion) -> Result<Self> {
        Check::new(api, "InputOptions", version)
    }

    pub fn output(api: RuntimeApiName, version: RuntimeVersion) -> Result<Self> {
        Check::new(api, "OutputOptions", version)
    }

    fn new(api: RuntimeApiName, suffix: &str, version: RuntimeVersion) -> Result<Self> {
        if !api.is_supported_on(version) {
            return Err(HarnessError::UnsupportedApi { api, version });
        }
        Ok(Check {
            option: format!("{api}{suffix}"),
            version,
        })
    }

    pub fn version(&self) -> RuntimeVersion {
        self.version
    }

    pub fn require(&self, present: bool, field: &'static str) -> Result<()> {
        if present {
            Ok(())
        } else {
            Err(HarnessError::InvalidOption {
                field,
                option: self.option.clone(),
                version: self.version,
            })
        }
    }
}

pub trait InputOptions {
    const API: RuntimeApiName;

    fn runtime_version(&self) -> RuntimeVersion;

    fn validate(&self) -> Result<()>;

    fn arguments(&self) -> Result<Arguments>;
}

pub trait OutputOptions {
    fn validate(&self) -> Result<()>;

    /// Expected output, or `None` when nothing was declared.
    fn expectation(&self) -> Result<Option<Output>>;
}

/// Structured values an output record can expect back.
pub trait Payload: Serialize {
    fn check(&self, _check: &Check) -> Result<()> {
        Ok(())
    }
}

impl Payload for String {}
impl Payload for bool {}
impl Payload for BTreeMap<String, String> {}

pub(crate) fn to_yaml<T: Serialize>(what: &str, value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|source| HarnessError::Serialize {
        what: what.to_string(),
        source,
    })
}

/// Embedded YAML document argument.
pub(crate) fn document<T: Serialize>(what: &str, value: &T) -> Result<Value> {
    to_yaml(what, value).map(Value::String)
}

/// Plain scalar argument, e.g. an enum rendered as its wire name.
pub(crate) fn scalar<T: Serialize>(what: &str, value: &T) -> Result<Value> {
    serde_yaml::to_value(value).map_err(|source| HarnessError::Serialize {
        what: what.to_string(),
        source,
    })
}

pub(crate) fn failed(error: &str, strategy: ValidationStrategy) -> Output {
    Output {
        result: ApiResult::Failed,
        content: error.to_string(),
        validation_strategy: strategy,
    }
}

/// Validates both records and assembles a single-API command.
pub fn new_command<I, O>(input: &I, output: &O) -> Result<Command>
where
    I: InputOptions,
    O: OutputOptions,
{
    input.validate()?;
    let arguments = input.arguments()?;
    let expected = output.expectation()?;
    Ok(Command::from(Api {
        name: I::API,
        version: input.runtime_version(),
        arguments,
        output: expected,
    }))
}

/// Input record whose fields are all mandatory strings.
macro_rules! string_input {
    ($(#[$meta:meta])* $name:ident for $api:ident { $($field:ident => $key:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            pub runtime_version: $crate::framework::types::RuntimeVersion,
            $(pub $field: String,)*
        }

        impl $crate::framework::options::InputOptions for $name {
            const API: $crate::framework::types::RuntimeApiName =
                $crate::framework::types::RuntimeApiName::$api;

            fn runtime_version(&self) -> $crate::framework::types::RuntimeVersion {
                self.runtime_version
            }

            #[allow(unused_variables)]
            fn validate(&self) -> $crate::error::Result<()> {
                let check = $crate::framework::options::Check::input(
                    Self::API,
                    self.runtime_version,
                )?;
                $(
                    check.require(
                        !self.$field.trim().is_empty(),
                        $crate::framework::types::ArgumentKey::$key.as_str(),
                    )?;
                )*
                Ok(())
            }

            #[allow(unused_mut)]
            fn arguments(&self) -> $crate::error::Result<$crate::framework::types::Arguments> {
                let mut args = $crate::framework::types::Arguments::new();
                $(
                    args.insert(
                        $crate::framework::types::ArgumentKey::$key,
                        serde_yaml::Value::from(self.$field.clone()),
                    );
                )*
                Ok(args)
            }
        }
    };
}

/// Output record of an API that returns nothing but may fail.
macro_rules! mutator_output {
    ($(#[$meta:meta])* $name:ident for $api:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            pub runtime_version: $crate::framework::types::RuntimeVersion,
            pub error: String,
            pub validation_strategy: $crate::framework::types::ValidationStrategy,
        }

        impl $crate::framework::options::OutputOptions for $name {
            fn validate(&self) -> $crate::error::Result<()> {
                $crate::framework::options::Check::output(
                    $crate::framework::types::RuntimeApiName::$api,
                    self.runtime_version,
                )
                .map(|_| ())
            }

            fn expectation(
                &self,
            ) -> $crate::error::Result<Option<$crate::framework::types::Output>> {
                if !self.error.is_empty() {
                    return Ok(Some($crate::framework::options::failed(
                        &self.error,
                        self.validation_strategy,
                    )));
                }
                $crate::framework::options::OutputOptions::validate(self)?;
                Ok(Some($crate::framework::types::Output {
                    validation_strategy: self.validation_strategy,
                    ..Default::default()
                }))
            }
        }
    };
}

/// Output record of an API that returns a structured value.
macro_rules! payload_output {
    ($(#[$meta:meta])* $name:ident for $api:ident { $field:ident: $ty:ty }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name {
            pub runtime_version: $crate::framework::types::RuntimeVersion,
            pub $field: Option<$ty>,
            pub error: String,
            pub validation_strategy: $crate::framework::types::ValidationStrategy,
        }

        impl $crate::framework::options::OutputOptions for $name {
            fn validate(&self) -> $crate::error::Result<()> {
                let check = $crate::framework::options::Check::output(
                    $crate::framework::types::RuntimeApiName::$api,
                    self.runtime_version,
                )?;
                check.require(self.$field.is_some(), stringify!($field))?;
                match &self.$field {
                    Some(payload) => {
                        $crate::framework::options::Payload::check(payload, &check)
                    }
                    None => Ok(()),
                }
            }

            fn expectation(
                &self,
            ) -> $crate::error::Result<Option<$crate::framework::types::Output>> {
                if !self.error.is_empty() {
                    return Ok(Some($crate::framework::options::failed(
                        &self.error,
                        self.validation_strategy,
                    )));
                }
                let Some(payload) = &self.$field else {
                    return Ok(None);
                };
                $crate::framework::options::OutputOptions::validate(self)?;
                Ok(Some($crate::framework::types::Output {
                    result: $crate::framework::types::ApiResult::Success,
                    content: $crate::framework::options::to_yaml(stringify!($field), payload)?,
                    validation_strategy: self.validation_strategy,
                }))
            }
        }
    };
}

/// `new_<api>_command` for one input/output record pair.
macro_rules! command_factory {
    ($(#[$meta:meta])* $fn_name:ident($input:ty, $output:ty)) => {
        $(#[$meta])*
        pub fn $fn_name(input: &$input, output: &$output) -> $crate::error::Result<$crate::framework::test_case::Command> {
            $crate::framework::options::new_command(input, output)
        }
    };
}

pub mod client_config;
pub mod context;
pub mod discovery;
pub mod env;
pub mod feature;
pub mod metadata;
pub mod server;

// ---- shared payloads ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalServerOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServerOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(default)]
    pub is_management_cluster: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementClusterOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OciDiscoveryOpts {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalDiscoveryOpts {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oci: Option<OciDiscoveryOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalDiscoveryOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,
}

impl Payload for DiscoveryOpts {
    fn check(&self, check: &Check) -> Result<()> {
        let name = self
            .oci
            .as_ref()
            .map(|oci| oci.name.as_str())
            .or_else(|| self.local.as_ref().map(|local| local.name.as_str()));
        check.require(
            self.oci.is_some() || self.local.is_some(),
            "discoverySource.oci|local",
        )?;
        check.require(
            name.is_some_and(|n| !n.is_empty()),
            "discoverySource.name",
        )
    }
}

/// Context in any edition's schema: set `context_type` for v0.25.4 and
/// `target` for v0.28.0 onwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServerOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_opts: Option<ClusterServerOpts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<DiscoveryOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_metadata: Option<Mapping>,
}

impl Payload for ContextOpts {
    fn check(&self, check: &Check) -> Result<()> {
        check.require(!self.name.is_empty(), "context.name")?;
        if check.version() <= RuntimeVersion::V0254 {
            check.require(self.context_type.is_some(), "context.type")?;
            check.require(
                self.additional_metadata.is_none(),
                "context.additionalMetadata",
            )?;
        } else {
            check.require(self.target.is_some(), "context.target")?;
        }
        self.discovery_sources
            .iter()
            .try_for_each(|source| source.check(check))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerOpts {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<ServerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServerOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_cluster_opts: Option<ManagementClusterOpts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<DiscoveryOpts>,
}

impl Payload for ServerOpts {
    fn check(&self, check: &Check) -> Result<()> {
        check.require(!self.name.is_empty(), "server.name")?;
        check.require(self.server_type.is_some(), "server.type")?;
        if check.version() == RuntimeVersion::V0116 {
            check.require(
                self.discovery_sources.is_empty(),
                "server.discoverySources",
            )?;
        }
        self.discovery_sources
            .iter()
            .try_for_each(|source| source.check(check))
    }
}
