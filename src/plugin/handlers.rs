//! Name-indexed handler tables, one per edition.
//!
//! A table holds exactly the APIs the support matrix lists for its edition;
//! anything else is answered with `command <name> not found` by the caller.
//! The same API name may bind to a different library entry point depending
//! on the edition (`SetContext` is `AddContext` on v0.25.4, `IsFeatureEnabled`
//! is the dotted-path `IsFeatureActivated` on v0.11.6).

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use super::arguments::{ArgReader, ArgumentError};
use super::views;
use crate::framework::types::{ApiResponse, ArgumentKey, RuntimeApiName, RuntimeVersion};
use crate::library::types::{ClientConfig, ContextType, PluginDiscovery, Server, Target};
use crate::library::{ConfigError, ConfigStore};

/// A plugin's view of the library: which edition it is and where state lives.
pub struct Edition {
    pub version: RuntimeVersion,
    pub store: ConfigStore,
}

impl Edition {
    pub fn new(version: RuntimeVersion, store: ConfigStore) -> Self {
        let store = if version < RuntimeVersion::V0900 {
            store.without_metadata()
        } else {
            store
        };
        Edition { version, store }
    }
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_yaml::Error),
}

pub type HandlerResult = Result<ApiResponse, HandlerError>;
pub type Handler = fn(&Edition, &ArgReader<'_>) -> HandlerResult;

/// Handlers implemented by the plugin built for `version`.
pub fn handler_table(version: RuntimeVersion) -> HashMap<RuntimeApiName, Handler> {
    RuntimeApiName::supported_on(version)
        .map(|api| (api, handler_for(api, version)))
        .collect()
}

fn handler_for(api: RuntimeApiName, version: RuntimeVersion) -> Handler {
    use RuntimeApiName::*;
    match api {
        SetContext if version == RuntimeVersion::V0254 => add_context,
        SetContext => set_context,
        GetContext => get_context,
        RemoveContext | DeleteContext => remove_context,
        SetCurrentContext => set_current_context,
        GetCurrentContext => get_current_context,
        RemoveCurrentContext => remove_current_context,
        SetServer => set_server,
        AddServer => add_server,
        PutServer => put_server,
        GetServer => get_server,
        RemoveServer | DeleteServer => remove_server,
        SetCurrentServer => set_current_server,
        GetCurrentServer => get_current_server,
        RemoveCurrentServer => remove_current_server,
        SetEnv => set_env,
        GetEnv => get_env,
        DeleteEnv => delete_env,
        GetEnvConfigurations => get_env_configurations,
        SetFeature => set_feature,
        IsFeatureEnabled if version == RuntimeVersion::V0116 => is_feature_activated,
        IsFeatureEnabled => is_feature_enabled,
        DeleteFeature => delete_feature,
        SetCliDiscoverySource => set_cli_discovery_source,
        GetCliDiscoverySource => get_cli_discovery_source,
        DeleteCliDiscoverySource => delete_cli_discovery_source,
        SetConfigMetadataSetting => set_config_metadata_setting,
        GetConfigMetadataSetting => get_config_metadata_setting,
        SetConfigMetadataPatchStrategy => set_config_metadata_patch_strategy,
        DeleteConfigMetadataSetting => delete_config_metadata_setting,
        GetMetadata => get_metadata,
        GetConfigMetadata => get_config_metadata,
        GetConfigMetadataPatchStrategy => get_config_metadata_patch_strategy,
        GetConfigMetadataSettings => get_config_metadata_settings,
        IsConfigMetadataSettingsEnabled => is_config_metadata_settings_enabled,
        UseUnifiedConfig => use_unified_config,
        GetClientConfig => get_client_config,
        StoreClientConfig => store_client_config,
    }
}

fn done() -> HandlerResult {
    Ok(ApiResponse::str(""))
}

fn map_of<T: Serialize>(value: T) -> HandlerResult {
    Ok(ApiResponse::map(serde_yaml::to_value(value)?))
}

// ---- contexts -----------------------------------------------------------------

fn add_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let ctx = args.decode(ArgumentKey::Context, |v| {
        views::context_from_value(edition.version, v)
    })?;
    let is_current = args.flag(ArgumentKey::IsCurrent)?;
    edition.store.add_context(ctx, is_current)?;
    done()
}

fn set_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let ctx = args.decode(ArgumentKey::Context, |v| {
        views::context_from_value(edition.version, v)
    })?;
    let is_current = args.flag(ArgumentKey::IsCurrent)?;
    edition.store.set_context(ctx, is_current)?;
    done()
}

fn get_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ContextName)?;
    let ctx = edition.store.get_context(&name)?;
    Ok(ApiResponse::map(views::context_to_value(edition.version, ctx)?))
}

fn remove_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ContextName)?;
    edition.store.remove_context(&name)?;
    done()
}

fn set_current_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ContextName)?;
    edition.store.set_current_context(&name)?;
    done()
}

/// v0.25.4 selects by `contextType`, later editions by `target`.
fn current_target(edition: &Edition, args: &ArgReader<'_>) -> Result<Target, ArgumentError> {
    if edition.version <= RuntimeVersion::V0254 {
        Ok(args.document::<ContextType>(ArgumentKey::ContextType)?.into())
    } else {
        args.document::<Target>(ArgumentKey::Target)
    }
}

fn get_current_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let target = current_target(edition, args)?;
    let ctx = edition.store.get_current_context(target)?;
    Ok(ApiResponse::map(views::context_to_value(edition.version, ctx)?))
}

fn remove_current_context(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let target = current_target(edition, args)?;
    edition.store.remove_current_context(target)?;
    done()
}

// ---- servers ------------------------------------------------------------------

fn server_arg(edition: &Edition, args: &ArgReader<'_>) -> Result<Server, ArgumentError> {
    args.decode(ArgumentKey::Server, |v| views::server_from_value(edition.version, v))
}

fn set_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let server = server_arg(edition, args)?;
    edition
        .store
        .set_server(server, args.flag(ArgumentKey::SetCurrent)?)?;
    done()
}

fn add_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let server = server_arg(edition, args)?;
    edition
        .store
        .add_server(server, args.flag(ArgumentKey::SetCurrent)?)?;
    done()
}

fn put_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let server = server_arg(edition, args)?;
    edition
        .store
        .put_server(server, args.flag(ArgumentKey::SetCurrent)?)?;
    done()
}

fn get_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ServerName)?;
    let server = edition.store.get_server(&name)?;
    Ok(ApiResponse::map(views::server_to_value(edition.version, server)?))
}

fn remove_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ServerName)?;
    edition.store.remove_server(&name)?;
    done()
}

fn set_current_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ServerName)?;
    edition.store.set_current_server(&name)?;
    done()
}

fn get_current_server(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    let server = edition.store.get_current_server()?;
    Ok(ApiResponse::map(views::server_to_value(edition.version, server)?))
}

fn remove_current_server(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::ServerName)?;
    edition.store.remove_current_server(&name)?;
    done()
}

// ---- env ----------------------------------------------------------------------

fn set_env(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    let value = args.optional_string(ArgumentKey::Value)?.unwrap_or_default();
    edition.store.set_env(&key, &value)?;
    done()
}

fn get_env(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    Ok(ApiResponse::str(edition.store.get_env(&key)?))
}

fn delete_env(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    edition.store.delete_env(&key)?;
    done()
}

fn get_env_configurations(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_env_configurations()?)
}

// ---- features -----------------------------------------------------------------

fn set_feature(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let plugin = args.string(ArgumentKey::Plugin)?;
    let key = args.string(ArgumentKey::Key)?;
    let value = args.string(ArgumentKey::Value)?;
    edition.store.set_feature(&plugin, &key, &value)?;
    done()
}

fn is_feature_enabled(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let plugin = args.string(ArgumentKey::Plugin)?;
    let key = args.string(ArgumentKey::Key)?;
    Ok(ApiResponse::boolean(
        edition.store.is_feature_enabled(&plugin, &key)?,
    ))
}

/// v0.11.6 addresses flags by a single `plugin.feature` path.
fn is_feature_activated(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let path = args.string(ArgumentKey::Key)?;
    let (plugin, feature) = path.split_once('.').ok_or_else(|| {
        ConfigError::Invalid(format!("feature path '{path}' must be '<plugin>.<feature>'"))
    })?;
    Ok(ApiResponse::boolean(
        edition.store.is_feature_enabled(plugin, feature)?,
    ))
}

fn delete_feature(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let plugin = args.string(ArgumentKey::Plugin)?;
    let key = args.string(ArgumentKey::Key)?;
    edition.store.delete_feature(&plugin, &key)?;
    done()
}

// ---- discovery sources --------------------------------------------------------

fn set_cli_discovery_source(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let source: PluginDiscovery = args.document(ArgumentKey::DiscoverySource)?;
    edition.store.set_cli_discovery_source(source)?;
    done()
}

fn get_cli_discovery_source(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::Name)?;
    map_of(edition.store.get_cli_discovery_source(&name)?)
}

fn delete_cli_discovery_source(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let name = args.string(ArgumentKey::Name)?;
    edition.store.delete_cli_discovery_source(&name)?;
    done()
}

// ---- metadata -----------------------------------------------------------------

fn set_config_metadata_setting(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    let value = args.string(ArgumentKey::Value)?;
    edition.store.set_config_metadata_setting(&key, &value)?;
    done()
}

fn get_config_metadata_setting(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    Ok(ApiResponse::str(
        edition.store.get_config_metadata_setting(&key)?,
    ))
}

fn set_config_metadata_patch_strategy(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    let value = args.string(ArgumentKey::Value)?;
    edition
        .store
        .set_config_metadata_patch_strategy(&key, &value)?;
    done()
}

fn delete_config_metadata_setting(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    edition.store.delete_config_metadata_setting(&key)?;
    done()
}

fn get_metadata(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_metadata()?)
}

fn get_config_metadata(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_config_metadata()?)
}

fn get_config_metadata_patch_strategy(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_config_metadata_patch_strategy()?)
}

fn get_config_metadata_settings(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_config_metadata_settings()?)
}

fn is_config_metadata_settings_enabled(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let key = args.string(ArgumentKey::Key)?;
    Ok(ApiResponse::boolean(
        edition.store.is_config_metadata_settings_enabled(&key)?,
    ))
}

fn use_unified_config(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    Ok(ApiResponse::boolean(edition.store.use_unified_config()?))
}

// ---- client config ------------------------------------------------------------

fn get_client_config(edition: &Edition, _args: &ArgReader<'_>) -> HandlerResult {
    map_of(edition.store.get_client_config()?)
}

fn store_client_config(edition: &Edition, args: &ArgReader<'_>) -> HandlerResult {
    let config: ClientConfig = args.document(ArgumentKey::ClientConfig)?;
    edition.store.store_client_config(config)?;
    done()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_follow_support_matrix() {
        for version in RuntimeVersion::ALL {
            let table = handler_table(version);
            for api in RuntimeApiName::ALL {
                assert_eq!(
                    table.contains_key(api),
                    api.is_supported_on(version),
                    "{api} on {version}"
                );
            }
        }
    }

    #[test]
    fn test_legacy_editions_omit_newer_apis() {
        let table = handler_table(RuntimeVersion::V0116);
        assert!(!table.contains_key(&RuntimeApiName::SetEnv));
        assert!(!table.contains_key(&RuntimeApiName::SetContext));
        assert!(table.contains_key(&RuntimeApiName::PutServer));
        assert!(table.contains_key(&RuntimeApiName::IsFeatureEnabled));
    }
}
