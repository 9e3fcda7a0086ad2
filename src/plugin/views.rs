//! Version-local payload shapes.
//!
//! Each edition reads and writes contexts and servers in its own schema:
//! `v0.25.4` knows contexts by `type`, later editions by `target`, and
//! `v0.11.6` servers carry no discovery sources. Conversions go through the
//! library's superset types.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::framework::types::RuntimeVersion;
use crate::library::types::{
    ClusterServer, Context, ContextType, GlobalServer, ManagementClusterServer, PluginDiscovery,
    Server, ServerType, Target,
};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct LegacyContext {
    name: String,
    #[serde(rename = "type")]
    context_type: ContextType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global_opts: Option<GlobalServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cluster_opts: Option<ClusterServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    discovery_sources: Vec<PluginDiscovery>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct TargetedContext {
    name: String,
    target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global_opts: Option<GlobalServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cluster_opts: Option<ClusterServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    discovery_sources: Vec<PluginDiscovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_metadata: Option<Mapping>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct LegacyServer {
    name: String,
    #[serde(rename = "type")]
    server_type: ServerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global_opts: Option<GlobalServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    management_cluster_opts: Option<ManagementClusterServer>,
}

fn uses_context_type(version: RuntimeVersion) -> bool {
    version <= RuntimeVersion::V0254
}

/// Parses a context argument written in `version`'s schema.
pub fn context_from_value(version: RuntimeVersion, value: Value) -> serde_yaml::Result<Context> {
    if uses_context_type(version) {
        let legacy: LegacyContext = serde_yaml::from_value(value)?;
        Ok(Context {
            name: legacy.name,
            target: Some(legacy.context_type.into()),
            context_type: Some(legacy.context_type),
            global_opts: legacy.global_opts,
            cluster_opts: legacy.cluster_opts,
            discovery_sources: legacy.discovery_sources,
            additional_metadata: None,
        })
    } else {
        let ctx: TargetedContext = serde_yaml::from_value(value)?;
        Ok(Context {
            name: ctx.name,
            target: Some(ctx.target),
            context_type: Some(ctx.target.into()),
            global_opts: ctx.global_opts,
            cluster_opts: ctx.cluster_opts,
            discovery_sources: ctx.discovery_sources,
            additional_metadata: ctx.additional_metadata,
        })
    }
}

/// Renders a stored context the way `version` exposes it.
pub fn context_to_value(version: RuntimeVersion, mut context: Context) -> serde_yaml::Result<Value> {
    context.normalize();
    let target = context.target.unwrap_or(Target::Kubernetes);
    if uses_context_type(version) {
        serde_yaml::to_value(LegacyContext {
            name: context.name,
            context_type: context.context_type.unwrap_or_else(|| target.into()),
            global_opts: context.global_opts,
            cluster_opts: context.cluster_opts,
            discovery_sources: context.discovery_sources,
        })
    } else {
        serde_yaml::to_value(TargetedContext {
            name: context.name,
            target,
            global_opts: context.global_opts,
            cluster_opts: context.cluster_opts,
            discovery_sources: context.discovery_sources,
            additional_metadata: context.additional_metadata,
        })
    }
}

pub fn server_from_value(version: RuntimeVersion, value: Value) -> serde_yaml::Result<Server> {
    if version == RuntimeVersion::V0116 {
        let legacy: LegacyServer = serde_yaml::from_value(value)?;
        Ok(Server {
            name: legacy.name,
            server_type: legacy.server_type,
            global_opts: legacy.global_opts,
            management_cluster_opts: legacy.management_cluster_opts,
            discovery_sources: Vec::new(),
        })
    } else {
        serde_yaml::from_value(value)
    }
}

pub fn server_to_value(version: RuntimeVersion, server: Server) -> serde_yaml::Result<Value> {
    if version == RuntimeVersion::V0116 {
        serde_yaml::to_value(LegacyServer {
            name: server.name,
            server_type: server.server_type,
            global_opts: server.global_opts,
            management_cluster_opts: server.management_cluster_opts,
        })
    } else {
        serde_yaml::to_value(server)
    }
}
