//! Runtime embedded in every `runtime-test-plugin-<version>` binary.
//!
//! A plugin reads an API script, runs each API against its edition of the
//! library and writes the resulting log map to stdout as YAML. Diagnostics go
//! to stderr only so stdout stays parseable.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub mod arguments;
pub mod handlers;
pub mod views;

use crate::framework::types::{Api, ApiLog, ApiResponse, RuntimeApiName, RuntimeVersion};
use crate::library::{ConfigPaths, ConfigStore};
use arguments::{parse_arguments, ArgReader};
use handlers::{handler_table, Edition, Handler};

#[derive(Parser, Debug)]
#[command(about = "Compatibility test plugin for one edition of the configuration library")]
pub struct PluginCli {
    #[command(subcommand)]
    pub cmd: PluginCommands,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommands {
    #[command(about = "Run an API script and print the log map as YAML")]
    Test {
        /// Path of the YAML API script
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// One script entry as written on disk.
///
/// Name, version and argument keys stay raw until the entry runs, so an
/// entry this edition does not understand costs only its own log entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub arguments: Mapping,
}

impl From<&Api> for ScriptEntry {
    fn from(api: &Api) -> Self {
        ScriptEntry {
            name: api.name.as_str().to_string(),
            version: api.version.as_str().to_string(),
            arguments: api
                .arguments
                .iter()
                .map(|(key, value)| (Value::from(key.as_str()), value.clone()))
                .collect(),
        }
    }
}

/// Logs keyed by the name each entry was invoked under.
pub type ScriptLogs = BTreeMap<String, Vec<ApiLog>>;

/// Entry point shared by the plugin binaries.
pub fn main(version: RuntimeVersion) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = PluginCli::parse();
    match cli.cmd {
        PluginCommands::Test { file } => {
            let entries = load_script(&file)?;
            let edition = Edition::new(version, ConfigStore::new(ConfigPaths::from_env()));
            let logs = run_script(&edition, &entries);
            let out = serde_yaml::to_string(&logs).context("encoding log map")?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(out.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptEntry>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading API script {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<ScriptEntry> = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing API script {}", path.display()))?;
    Ok(entries)
}

/// Runs `entries` in order. Per-API failures become `err` log entries.
pub fn run_script(edition: &Edition, entries: &[ScriptEntry]) -> ScriptLogs {
    let table = handler_table(edition.version);
    let mut logs = ScriptLogs::new();
    for entry in entries {
        match entry.version.parse::<RuntimeVersion>() {
            Ok(version) if version == edition.version => {}
            _ => warn!(
                api = %entry.name,
                requested = %entry.version,
                edition = %edition.version,
                "API addressed to another edition"
            ),
        }
        let response = execute(edition, &table, entry);
        debug!(api = %entry.name, response = %response.response_type, "executed");
        logs.entry(entry.name.clone())
            .or_default()
            .push(ApiLog::from(response));
    }
    logs
}

fn execute(
    edition: &Edition,
    table: &HashMap<RuntimeApiName, Handler>,
    entry: &ScriptEntry,
) -> ApiResponse {
    let found = entry
        .name
        .parse::<RuntimeApiName>()
        .ok()
        .and_then(|api| table.get(&api).map(|handler| (api, handler)));
    let Some((api, handler)) = found else {
        return ApiResponse::err(format!("command {} not found", entry.name));
    };
    let args = match parse_arguments(api, &entry.arguments) {
        Ok(args) => args,
        Err(e) => return ApiResponse::err(e.to_string()),
    };
    handler(edition, &ArgReader::new(api, &args))
        .unwrap_or_else(|e| ApiResponse::err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::types::{ArgumentKey, ResponseType, RuntimeApiName};
    use serde_yaml::Value;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn edition(dir: &TempDir, version: RuntimeVersion) -> Edition {
        Edition::new(
            version,
            ConfigStore::new(ConfigPaths {
                config: dir.path().join("config.yaml"),
                next_gen: dir.path().join("config-ng.yaml"),
                metadata: dir.path().join("metadata.yaml"),
            }),
        )
    }

    fn api(
        name: RuntimeApiName,
        version: RuntimeVersion,
        args: &[(ArgumentKey, Value)],
    ) -> ScriptEntry {
        ScriptEntry::from(&Api {
            name,
            version,
            arguments: args.iter().cloned().collect::<BTreeMap<_, _>>(),
            output: None,
        })
    }

    #[test]
    fn test_repeated_calls_keep_order() {
        let dir = TempDir::new().unwrap();
        let latest = edition(&dir, RuntimeVersion::Latest);
        let script = vec![
            api(
                RuntimeApiName::SetEnv,
                RuntimeVersion::Latest,
                &[(ArgumentKey::Key, "a".into()), (ArgumentKey::Value, "1".into())],
            ),
            api(
                RuntimeApiName::GetEnv,
                RuntimeVersion::Latest,
                &[(ArgumentKey::Key, "a".into())],
            ),
            api(
                RuntimeApiName::DeleteEnv,
                RuntimeVersion::Latest,
                &[(ArgumentKey::Key, "a".into())],
            ),
            api(
                RuntimeApiName::GetEnv,
                RuntimeVersion::Latest,
                &[(ArgumentKey::Key, "a".into())],
            ),
        ];
        let logs = run_script(&latest, &script);
        let gets = &logs["GetEnv"];
        assert_eq!(gets.len(), 2);
        assert_eq!(
            gets[0].api_response.as_ref().unwrap().response_body,
            Value::from("1")
        );
        assert_eq!(gets[1].error, "env a not found");
    }

    #[test]
    fn test_unsupported_api_is_reported_as_not_found() {
        let dir = TempDir::new().unwrap();
        let legacy = edition(&dir, RuntimeVersion::V0116);
        let script = vec![api(
            RuntimeApiName::SetEnv,
            RuntimeVersion::V0116,
            &[(ArgumentKey::Key, "a".into()), (ArgumentKey::Value, "1".into())],
        )];
        let logs = run_script(&legacy, &script);
        let log = &logs["SetEnv"][0];
        let response = log.api_response.as_ref().unwrap();
        assert_eq!(response.response_type, ResponseType::Err);
        assert_eq!(response.response_body, Value::from("command SetEnv not found"));
    }

    #[test]
    fn test_missing_argument_becomes_err_entry() {
        let dir = TempDir::new().unwrap();
        let latest = edition(&dir, RuntimeVersion::Latest);
        let script = vec![api(RuntimeApiName::GetContext, RuntimeVersion::Latest, &[])];
        let logs = run_script(&latest, &script);
        assert_eq!(
            logs["GetContext"][0].error,
            "invalid argument 'contextName' for GetContext"
        );
    }

    #[test]
    fn test_editions_share_state_through_files() {
        let dir = TempDir::new().unwrap();
        let context = "name: c1\ntarget: kubernetes\nglobalOpts:\n  endpoint: e1\n";
        run_script(
            &edition(&dir, RuntimeVersion::Latest),
            &[api(
                RuntimeApiName::SetContext,
                RuntimeVersion::Latest,
                &[(ArgumentKey::Context, context.into())],
            )],
        );
        let logs = run_script(
            &edition(&dir, RuntimeVersion::V0254),
            &[api(
                RuntimeApiName::GetContext,
                RuntimeVersion::V0254,
                &[(ArgumentKey::ContextName, "c1".into())],
            )],
        );
        let body = &logs["GetContext"][0]
            .api_response
            .as_ref()
            .unwrap()
            .response_body;
        assert_eq!(body["type"], Value::from("k8s"));
        assert_eq!(body["globalOpts"]["endpoint"], Value::from("e1"));
    }

    #[test]
    fn test_load_script_reads_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.yaml");
        std::fs::write(
            &path,
            "- name: GetEnv\n  version: v0.28.0\n  arguments:\n    key: k\n",
        )
        .unwrap();
        let apis = load_script(&path).unwrap();
        assert_eq!(apis.len(), 1);
        assert_eq!(apis[0].version, "v0.28.0");
        assert_eq!(apis[0].arguments.get("key"), Some(&Value::from("k")));
        assert!(load_script(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_unknown_name_is_logged_without_losing_earlier_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.yaml");
        std::fs::write(
            &path,
            "- name: SetEnv\n  version: latest\n  arguments:\n    key: k\n    value: v\n\
             - name: GetFancyThing\n  version: latest\n\
             - name: GetEnv\n  version: latest\n  arguments:\n    key: k\n",
        )
        .unwrap();
        let entries = load_script(&path).unwrap();
        let logs = run_script(&edition(&dir, RuntimeVersion::Latest), &entries);

        assert_eq!(logs["SetEnv"][0].error, "");
        assert_eq!(logs["GetFancyThing"][0].error, "command GetFancyThing not found");
        assert_eq!(
            logs["GetEnv"][0].api_response.as_ref().unwrap().response_body,
            Value::from("v")
        );
    }

    #[test]
    fn test_unknown_argument_key_becomes_err_entry() {
        let dir = TempDir::new().unwrap();
        let mut entry = api(
            RuntimeApiName::GetEnv,
            RuntimeVersion::Latest,
            &[(ArgumentKey::Key, "k".into())],
        );
        entry.arguments.insert(Value::from("colour"), Value::from("red"));
        let logs = run_script(&edition(&dir, RuntimeVersion::Latest), &[entry]);
        assert_eq!(logs["GetEnv"][0].error, "invalid argument 'colour' for GetEnv");
    }
}
