//! On-disk schema of the configuration library.
//!
//! Every field written by any edition is kept here, so a document produced by
//! an old plugin still deserializes in a newer one and vice versa. Version
//! specific projections live in `plugin::views`.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

/// Target a context talks to (`v0.28.0` and later).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    #[serde(rename = "kubernetes", alias = "k8s")]
    Kubernetes,
    #[serde(rename = "mission-control", alias = "tmc")]
    MissionControl,
}

/// Context kind used by `v0.25.4`, superseded by [`Target`].
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextType {
    #[serde(rename = "k8s", alias = "kubernetes")]
    K8s,
    #[serde(rename = "tmc", alias = "mission-control")]
    Tmc,
}

impl From<ContextType> for Target {
    fn from(value: ContextType) -> Self {
        match value {
            ContextType::K8s => Target::Kubernetes,
            ContextType::Tmc => Target::MissionControl,
        }
    }
}

impl From<Target> for ContextType {
    fn from(value: Target) -> Self {
        match value {
            Target::Kubernetes => ContextType::K8s,
            Target::MissionControl => ContextType::Tmc,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalServer {
    #[serde(default)]
    pub endpoint: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(default)]
    pub is_management_cluster: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManagementClusterServer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OciDiscovery {
    pub name: String,
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LocalDiscovery {
    pub name: String,
    pub path: String,
}

/// Where plugins are discovered from; exactly one source is set.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PluginDiscovery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oci: Option<OciDiscovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalDiscovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,
}

impl PluginDiscovery {
    pub fn name(&self) -> Option<&str> {
        self.oci
            .as_ref()
            .map(|oci| oci.name.as_str())
            .or_else(|| self.local.as_ref().map(|local| local.name.as_str()))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub context_type: Option<ContextType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_opts: Option<ClusterServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_metadata: Option<Mapping>,
}

impl Context {
    /// Fills whichever of `target`/`type` is missing from the other.
    pub fn normalize(&mut self) {
        match (self.target, self.context_type) {
            (Some(target), None) => self.context_type = Some(target.into()),
            (None, Some(kind)) => self.target = Some(kind.into()),
            _ => {}
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerType {
    #[default]
    #[serde(rename = "managementcluster")]
    ManagementCluster,
    #[serde(rename = "global")]
    Global,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub name: String,
    #[serde(rename = "type", default)]
    pub server_type: ServerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_cluster_opts: Option<ManagementClusterServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<PluginDiscovery>,
}

/// Plugin name to feature name to flag value.
pub type FeatureMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliOptions>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: FeatureMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Whole client configuration as returned by `GetClientConfig`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_server: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_contexts: Vec<Context>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub current_context: BTreeMap<Target, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_options: Option<ClientOptions>,
}

/// Document stored in `TANZU_CONFIG`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_options: Option<ClientOptions>,
}

/// Document stored in `TANZU_CONFIG_NEXT_GEN`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NextGenDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_contexts: Vec<Context>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub current_context: BTreeMap<Target, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMetadata {
    #[serde(default)]
    pub patch_strategy: BTreeMap<String, String>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// Document stored in `TANZU_CONFIG_METADATA`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_metadata: Option<ConfigMetadata>,
}
