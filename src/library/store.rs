//! File-backed store behind every library call.
//!
//! Each call loads the relevant document, mutates it and writes it back, so
//! successive plugin processes pointed at the same files observe each other's
//! changes. Missing or empty files read as empty documents.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use super::types::{
    ClientConfig, ClientOptions, CliOptions, ClusterServer, ConfigMetadata, Context,
    GlobalServer, LegacyDocument, ManagementClusterServer, Metadata, NextGenDocument,
    PluginDiscovery, Server, Target,
};
use super::{ConfigError, Result};
use crate::constants::{
    CONFIG_FILE, CONFIG_HOME_DIR, CONFIG_METADATA_FILE, CONFIG_NEXT_GEN_FILE, TANZU_CONFIG,
    TANZU_CONFIG_METADATA, TANZU_CONFIG_NEXT_GEN,
};

const PATCH_REPLACE: &str = "replace";
const PATCH_MERGE: &str = "merge";

/// Setting toggled by `UseUnifiedConfig`.
pub const USE_UNIFIED_CONFIG: &str = "useUnifiedConfig";

/// Locations of the three configuration documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config: PathBuf,
    pub next_gen: PathBuf,
    pub metadata: PathBuf,
}

impl ConfigPaths {
    /// Reads the substrate variables, falling back to `~/.config/tanzu/*`
    /// for any that is unset.
    pub fn from_env() -> Self {
        let home = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_HOME_DIR);
        let resolve = |var: &str, file: &str| {
            env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(file))
        };
        ConfigPaths {
            config: resolve(TANZU_CONFIG, CONFIG_FILE),
            next_gen: resolve(TANZU_CONFIG_NEXT_GEN, CONFIG_NEXT_GEN_FILE),
            metadata: resolve(TANZU_CONFIG_METADATA, CONFIG_METADATA_FILE),
        }
    }
}

pub struct ConfigStore {
    paths: ConfigPaths,
    honor_metadata: bool,
}

impl ConfigStore {
    pub fn new(paths: ConfigPaths) -> Self {
        ConfigStore {
            paths,
            honor_metadata: true,
        }
    }

    /// Editions that predate config metadata never read the metadata file;
    /// patch strategies are then always `merge`.
    pub fn without_metadata(mut self) -> Self {
        self.honor_metadata = false;
        self
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    // ---- contexts -------------------------------------------------------

    /// Inserts or patches a context. Nested options merge unless the
    /// metadata declares a `replace` patch strategy for them.
    pub fn set_context(&self, context: Context, set_current: bool) -> Result<()> {
        let context = validated_context(context)?;
        let strategy = self.patch_strategies()?;
        let current_target = context.target;
        self.update(&self.paths.next_gen, |doc: &mut NextGenDocument| {
            match doc
                .known_contexts
                .iter_mut()
                .find(|c| c.name == context.name)
            {
                Some(existing) => merge_context(existing, context.clone(), &strategy),
                None => doc.known_contexts.push(context.clone()),
            }
            if set_current {
                if let Some(target) = current_target {
                    doc.current_context.insert(target, context.name.clone());
                }
            }
            Ok(())
        })
    }

    /// Inserts or wholly replaces a context.
    pub fn add_context(&self, context: Context, set_current: bool) -> Result<()> {
        let context = validated_context(context)?;
        self.update(&self.paths.next_gen, |doc: &mut NextGenDocument| {
            doc.known_contexts.retain(|c| c.name != context.name);
            if set_current {
                if let Some(target) = context.target {
                    doc.current_context.insert(target, context.name.clone());
                }
            }
            doc.known_contexts.push(context.clone());
            Ok(())
        })
    }

    pub fn get_context(&self, name: &str) -> Result<Context> {
        let doc: NextGenDocument = self.load(&self.paths.next_gen)?;
        doc.known_contexts
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| not_found("context", name))
    }

    pub fn remove_context(&self, name: &str) -> Result<()> {
        self.update(&self.paths.next_gen, |doc: &mut NextGenDocument| {
            let before = doc.known_contexts.len();
            doc.known_contexts.retain(|c| c.name != name);
            if doc.known_contexts.len() == before {
                return Err(not_found("context", name));
            }
            doc.current_context.retain(|_, current| current != name);
            Ok(())
        })
    }

    pub fn set_current_context(&self, name: &str) -> Result<()> {
        self.update(&self.paths.next_gen, |doc: &mut NextGenDocument| {
            let target = doc
                .known_contexts
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(|| not_found("context", name))?
                .target
                .ok_or_else(|| ConfigError::Invalid(format!("context {name} has no target")))?;
            doc.current_context.insert(target, name.to_string());
            Ok(())
        })
    }

    pub fn get_current_context(&self, target: Target) -> Result<Context> {
        let doc: NextGenDocument = self.load(&self.paths.next_gen)?;
        let name = doc
            .current_context
            .get(&target)
            .ok_or(ConfigError::CurrentNotFound("context"))?;
        doc.known_contexts
            .iter()
            .find(|c| &c.name == name)
            .cloned()
            .ok_or_else(|| not_found("context", name))
    }

    pub fn remove_current_context(&self, target: Target) -> Result<()> {
        self.update(&self.paths.next_gen, |doc: &mut NextGenDocument| {
            doc.current_context
                .remove(&target)
                .map(|_| ())
                .ok_or(ConfigError::CurrentNotFound("context"))
        })
    }

    // ---- servers --------------------------------------------------------

    pub fn set_server(&self, server: Server, set_current: bool) -> Result<()> {
        let server = validated_server(server)?;
        let strategy = self.patch_strategies()?;
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            match doc.known_servers.iter_mut().find(|s| s.name == server.name) {
                Some(existing) => merge_server(existing, server.clone(), &strategy),
                None => doc.known_servers.push(server.clone()),
            }
            if set_current {
                doc.current_server = server.name.clone();
            }
            Ok(())
        })
    }

    /// Fails when a server with the same name exists.
    pub fn add_server(&self, server: Server, set_current: bool) -> Result<()> {
        let server = validated_server(server)?;
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            if doc.known_servers.iter().any(|s| s.name == server.name) {
                return Err(ConfigError::AlreadyExists {
                    kind: "server",
                    name: server.name.clone(),
                });
            }
            if set_current {
                doc.current_server = server.name.clone();
            }
            doc.known_servers.push(server.clone());
            Ok(())
        })
    }

    /// Inserts or wholly replaces a server.
    pub fn put_server(&self, server: Server, set_current: bool) -> Result<()> {
        let server = validated_server(server)?;
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            match doc.known_servers.iter_mut().find(|s| s.name == server.name) {
                Some(existing) => *existing = server.clone(),
                None => doc.known_servers.push(server.clone()),
            }
            if set_current {
                doc.current_server = server.name.clone();
            }
            Ok(())
        })
    }

    pub fn get_server(&self, name: &str) -> Result<Server> {
        let doc: LegacyDocument = self.load(&self.paths.config)?;
        doc.known_servers
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| not_found("server", name))
    }

    pub fn remove_server(&self, name: &str) -> Result<()> {
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            let before = doc.known_servers.len();
            doc.known_servers.retain(|s| s.name != name);
            if doc.known_servers.len() == before {
                return Err(not_found("server", name));
            }
            if doc.current_server == name {
                doc.current_server.clear();
            }
            Ok(())
        })
    }

    pub fn set_current_server(&self, name: &str) -> Result<()> {
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            if !doc.known_servers.iter().any(|s| s.name == name) {
                return Err(not_found("server", name));
            }
            doc.current_server = name.to_string();
            Ok(())
        })
    }

    pub fn get_current_server(&self) -> Result<Server> {
        let doc: LegacyDocument = self.load(&self.paths.config)?;
        if doc.current_server.is_empty() {
            return Err(ConfigError::CurrentNotFound("server"));
        }
        doc.known_servers
            .iter()
            .find(|s| s.name == doc.current_server)
            .cloned()
            .ok_or_else(|| not_found("server", &doc.current_server))
    }

    pub fn remove_current_server(&self, name: &str) -> Result<()> {
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            if doc.current_server != name {
                return Err(ConfigError::CurrentNotFound("server"));
            }
            doc.current_server.clear();
            Ok(())
        })
    }

    // ---- env --------------------------------------------------------------

    pub fn set_env(&self, key: &str, value: &str) -> Result<()> {
        require_non_empty("key", key)?;
        self.update_options(|options| {
            options.env.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    pub fn get_env(&self, key: &str) -> Result<String> {
        self.get_env_configurations()?
            .remove(key)
            .ok_or_else(|| not_found("env", key))
    }

    pub fn delete_env(&self, key: &str) -> Result<()> {
        self.update_options(|options| {
            options.env.remove(key);
            Ok(())
        })
    }

    pub fn get_env_configurations(&self) -> Result<BTreeMap<String, String>> {
        let doc: LegacyDocument = self.load(&self.paths.config)?;
        Ok(doc.client_options.map(|o| o.env).unwrap_or_default())
    }

    // ---- features ---------------------------------------------------------

    pub fn set_feature(&self, plugin: &str, key: &str, value: &str) -> Result<()> {
        require_non_empty("plugin", plugin)?;
        require_non_empty("key", key)?;
        self.update_options(|options| {
            options
                .features
                .entry(plugin.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    /// Unknown flags read as disabled.
    pub fn is_feature_enabled(&self, plugin: &str, key: &str) -> Result<bool> {
        let doc: LegacyDocument = self.load(&self.paths.config)?;
        Ok(doc
            .client_options
            .and_then(|o| o.features.get(plugin).and_then(|f| f.get(key)).cloned())
            .is_some_and(|value| value.eq_ignore_ascii_case("true")))
    }

    pub fn delete_feature(&self, plugin: &str, key: &str) -> Result<()> {
        self.update_options(|options| {
            if let Some(flags) = options.features.get_mut(plugin) {
                flags.remove(key);
                if flags.is_empty() {
                    options.features.remove(plugin);
                }
            }
            Ok(())
        })
    }

    // ---- discovery sources ------------------------------------------------

    pub fn set_cli_discovery_source(&self, source: PluginDiscovery) -> Result<()> {
        let name = source
            .name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::Invalid("discovery source name cannot be empty".into()))?
            .to_string();
        self.update_options(|options| {
            let sources = &mut options.cli.get_or_insert_with(CliOptions::default).discovery_sources;
            match sources.iter_mut().find(|s| s.name() == Some(name.as_str())) {
                Some(existing) => *existing = source.clone(),
                None => sources.push(source.clone()),
            }
            Ok(())
        })
    }

    pub fn get_cli_discovery_source(&self, name: &str) -> Result<PluginDiscovery> {
        let doc: LegacyDocument = self.load(&self.paths.config)?;
        doc.client_options
            .and_then(|o| o.cli)
            .and_then(|cli| {
                cli.discovery_sources
                    .into_iter()
                    .find(|s| s.name() == Some(name))
            })
            .ok_or_else(|| not_found("discovery source", name))
    }

    pub fn delete_cli_discovery_source(&self, name: &str) -> Result<()> {
        self.update_options(|options| {
            let sources = options
                .cli
                .as_mut()
                .map(|cli| &mut cli.discovery_sources)
                .ok_or_else(|| not_found("discovery source", name))?;
            let before = sources.len();
            sources.retain(|s| s.name() != Some(name));
            if sources.len() == before {
                return Err(not_found("discovery source", name));
            }
            Ok(())
        })
    }

    // ---- metadata ---------------------------------------------------------

    pub fn get_metadata(&self) -> Result<Metadata> {
        self.load(&self.paths.metadata)
    }

    pub fn get_config_metadata(&self) -> Result<ConfigMetadata> {
        Ok(self.get_metadata()?.config_metadata.unwrap_or_default())
    }

    pub fn get_config_metadata_patch_strategy(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.get_config_metadata()?.patch_strategy)
    }

    pub fn get_config_metadata_settings(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.get_config_metadata()?.settings)
    }

    pub fn get_config_metadata_setting(&self, key: &str) -> Result<String> {
        self.get_config_metadata_settings()?
            .remove(key)
            .ok_or_else(|| not_found("setting", key))
    }

    pub fn is_config_metadata_settings_enabled(&self, key: &str) -> Result<bool> {
        Ok(self
            .get_config_metadata_settings()?
            .get(key)
            .is_some_and(|value| value.eq_ignore_ascii_case("true")))
    }

    pub fn use_unified_config(&self) -> Result<bool> {
        self.is_config_metadata_settings_enabled(USE_UNIFIED_CONFIG)
    }

    pub fn set_config_metadata_setting(&self, key: &str, value: &str) -> Result<()> {
        require_non_empty("key", key)?;
        self.update_metadata(|metadata| {
            metadata.settings.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    pub fn delete_config_metadata_setting(&self, key: &str) -> Result<()> {
        self.update_metadata(|metadata| {
            metadata.settings.remove(key);
            Ok(())
        })
    }

    /// `value` must be `replace` or `merge` (case-insensitive).
    pub fn set_config_metadata_patch_strategy(&self, key: &str, value: &str) -> Result<()> {
        require_non_empty("key", key)?;
        let normalized = value.to_ascii_lowercase();
        if normalized != PATCH_REPLACE && normalized != PATCH_MERGE {
            return Err(ConfigError::Invalid(format!(
                "invalid patch strategy '{value}', expected '{PATCH_REPLACE}' or '{PATCH_MERGE}'"
            )));
        }
        self.update_metadata(|metadata| {
            metadata.patch_strategy.insert(key.to_string(), normalized.clone());
            Ok(())
        })
    }

    // ---- whole client config ----------------------------------------------

    pub fn get_client_config(&self) -> Result<ClientConfig> {
        let legacy: LegacyDocument = self.load(&self.paths.config)?;
        let next_gen: NextGenDocument = self.load(&self.paths.next_gen)?;
        Ok(ClientConfig {
            known_servers: legacy.known_servers,
            current_server: legacy.current_server,
            known_contexts: next_gen.known_contexts,
            current_context: next_gen.current_context,
            client_options: legacy.client_options,
        })
    }

    /// Overwrites both documents with the given configuration.
    pub fn store_client_config(&self, config: ClientConfig) -> Result<()> {
        let mut known_contexts = config.known_contexts;
        known_contexts.iter_mut().for_each(Context::normalize);
        self.save(
            &self.paths.config,
            &LegacyDocument {
                known_servers: config.known_servers,
                current_server: config.current_server,
                client_options: config.client_options,
            },
        )?;
        self.save(
            &self.paths.next_gen,
            &NextGenDocument {
                known_contexts,
                current_context: config.current_context,
            },
        )
    }

    // ---- plumbing -------------------------------------------------------------

    fn patch_strategies(&self) -> Result<BTreeMap<String, String>> {
        if self.honor_metadata {
            self.get_config_metadata_patch_strategy()
        } else {
            Ok(BTreeMap::new())
        }
    }

    fn update_options<R>(&self, f: impl FnOnce(&mut ClientOptions) -> Result<R>) -> Result<R> {
        self.update(&self.paths.config, |doc: &mut LegacyDocument| {
            f(doc.client_options.get_or_insert_with(ClientOptions::default))
        })
    }

    fn update_metadata<R>(&self, f: impl FnOnce(&mut ConfigMetadata) -> Result<R>) -> Result<R> {
        self.update(&self.paths.metadata, |doc: &mut Metadata| {
            f(doc.config_metadata.get_or_insert_with(ConfigMetadata::default))
        })
    }

    fn update<T, R>(&self, path: &Path, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let mut doc: T = self.load(path)?;
        let result = f(&mut doc)?;
        self.save(path, &doc)?;
        Ok(result)
    }

    fn load<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(T::default());
        }
        serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save<T: Serialize>(&self, path: &Path, doc: &T) -> Result<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let data = serde_yaml::to_string(doc)?;
        fs::write(path, data).map_err(write_err)
    }
}

fn not_found(kind: &'static str, name: &str) -> ConfigError {
    ConfigError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn validated_context(mut context: Context) -> Result<Context> {
    require_non_empty("context name", &context.name)?;
    context.normalize();
    if context.target.is_none() {
        return Err(ConfigError::Invalid(format!(
            "context {} has no target",
            context.name
        )));
    }
    Ok(context)
}

fn validated_server(server: Server) -> Result<Server> {
    require_non_empty("server name", &server.name)?;
    Ok(server)
}

fn replaces(strategy: &BTreeMap<String, String>, path: &str) -> bool {
    strategy.get(path).is_some_and(|s| s == PATCH_REPLACE)
}

fn merge_context(existing: &mut Context, update: Context, strategy: &BTreeMap<String, String>) {
    if update.target.is_some() {
        existing.target = update.target;
        existing.context_type = update.context_type;
    }
    if let Some(global) = update.global_opts {
        existing.global_opts = Some(match existing.global_opts.take() {
            Some(current) if !replaces(strategy, "contexts.globalOpts") => {
                merge_global(current, global)
            }
            _ => global,
        });
    }
    if let Some(cluster) = update.cluster_opts {
        existing.cluster_opts = Some(match existing.cluster_opts.take() {
            Some(current) if !replaces(strategy, "contexts.clusterOpts") => {
                ClusterServer {
                    endpoint: pick(current.endpoint, cluster.endpoint),
                    path: pick(current.path, cluster.path),
                    context: pick(current.context, cluster.context),
                    is_management_cluster: cluster.is_management_cluster,
                }
            }
            _ => cluster,
        });
    }
    if !update.discovery_sources.is_empty() {
        existing.discovery_sources = update.discovery_sources;
    }
    if let Some(extra) = update.additional_metadata {
        existing.additional_metadata = Some(match existing.additional_metadata.take() {
            Some(mut current) if !replaces(strategy, "contexts.additionalMetadata") => {
                current.extend(extra);
                current
            }
            _ => extra,
        });
    }
}

fn merge_server(existing: &mut Server, update: Server, strategy: &BTreeMap<String, String>) {
    existing.server_type = update.server_type;
    if let Some(global) = update.global_opts {
        existing.global_opts = Some(match existing.global_opts.take() {
            Some(current) if !replaces(strategy, "servers.globalOpts") => {
                merge_global(current, global)
            }
            _ => global,
        });
    }
    if let Some(mc) = update.management_cluster_opts {
        existing.management_cluster_opts = Some(match existing.management_cluster_opts.take() {
            Some(current) if !replaces(strategy, "servers.managementClusterOpts") => {
                ManagementClusterServer {
                    endpoint: pick(current.endpoint, mc.endpoint),
                    path: pick(current.path, mc.path),
                    context: pick(current.context, mc.context),
                }
            }
            _ => mc,
        });
    }
    if !update.discovery_sources.is_empty() {
        existing.discovery_sources = update.discovery_sources;
    }
}

fn merge_global(current: GlobalServer, update: GlobalServer) -> GlobalServer {
    GlobalServer {
        endpoint: pick(current.endpoint, update.endpoint),
    }
}

/// Non-empty updates win.
fn pick(current: String, update: String) -> String {
    if update.is_empty() {
        current
    } else {
        update
    }
}
