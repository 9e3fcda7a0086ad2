//! Dispatches a test case to the plugin binaries.
//!
//! Each command's APIs are grouped by version; every group becomes one YAML
//! script run by that version's plugin against the shared substrate. Logs
//! are validated right after each run, so a later group never executes once
//! an earlier expectation has failed.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as ProcessCommand;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::{NO_COLOR, TANZU_BIN, TANZU_CLI_NO_COLOR, TERM};
use crate::error::{HarnessError, Result};
use crate::framework::substrate::Substrate;
use crate::framework::test_case::{script_yaml, Command, TestCase};
use crate::framework::types::{Api, ApiLog, LogMap, RuntimeApiName, RuntimeVersion};
use crate::framework::validator;

/// One plugin process and what it logged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInvocation {
    pub version: RuntimeVersion,
    pub binary: PathBuf,
    pub apis: usize,
    pub logs: LogMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseOutcome {
    pub name: String,
    pub invocations: Vec<PluginInvocation>,
}

/// APIs of one command that target the same version, tagged with their
/// position in the test case.
struct VersionGroup<'a> {
    version: RuntimeVersion,
    apis: Vec<(usize, &'a Api)>,
}

/// Splits a command by version. Groups follow the first appearance of their
/// version; APIs keep their relative order inside a group.
fn group_by_version(command: &Command, first_index: usize) -> Vec<VersionGroup<'_>> {
    let mut groups: Vec<VersionGroup<'_>> = Vec::new();
    for (offset, api) in command.apis.iter().enumerate() {
        let entry = (first_index + offset, api);
        match groups.iter_mut().find(|g| g.version == api.version) {
            Some(group) => group.apis.push(entry),
            None => groups.push(VersionGroup {
                version: api.version,
                apis: vec![entry],
            }),
        }
    }
    groups
}

pub struct Runner {
    plugins_dir: PathBuf,
    substrate_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Runner {
            plugins_dir: plugins_dir.into(),
            substrate_dir: None,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Deadline for each plugin process.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Directory for the substrate files instead of the system temp dir.
    pub fn with_substrate_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.substrate_dir = Some(dir.into());
        self
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Looks for the version's binary directly in the plugins directory,
    /// then in a per-version subdirectory.
    pub fn resolve_binary(&self, version: RuntimeVersion) -> Result<PathBuf> {
        let name = version.plugin_binary_name();
        [
            self.plugins_dir.join(&name),
            self.plugins_dir.join(version.as_str()).join(&name),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or(HarnessError::PluginNotFound(version))
    }

    /// Runs every command of `case` in order against a fresh substrate.
    /// The substrate is removed whatever the outcome.
    pub async fn execute(&self, case: &TestCase) -> Result<TestCaseOutcome> {
        case.validate()?;

        let mut binaries = HashMap::new();
        for api in case.apis() {
            if !binaries.contains_key(&api.version) {
                binaries.insert(api.version, self.resolve_binary(api.version)?);
            }
        }

        let mut substrate = match &self.substrate_dir {
            Some(dir) => Substrate::create_in(dir),
            None => Substrate::create(),
        }
        .map_err(HarnessError::Substrate)?;

        info!(test_case = %case.name, commands = case.commands.len(), "running test case");
        let result = self.run_commands(case, &binaries, &substrate).await;
        if let Err(e) = substrate.cleanup() {
            warn!(test_case = %case.name, "failed to remove configuration substrate: {e}");
        }
        match &result {
            Ok(_) => info!(test_case = %case.name, "test case passed"),
            Err(e) => info!(test_case = %case.name, "test case failed: {e}"),
        }
        result
    }

    async fn run_commands(
        &self,
        case: &TestCase,
        binaries: &HashMap<RuntimeVersion, PathBuf>,
        substrate: &Substrate,
    ) -> Result<TestCaseOutcome> {
        let mut outcome = TestCaseOutcome {
            name: case.name.clone(),
            invocations: Vec::new(),
        };
        let mut next_index = 0;
        for command in &case.commands {
            for group in group_by_version(command, next_index) {
                let binary = binaries
                    .get(&group.version)
                    .ok_or(HarnessError::PluginNotFound(group.version))?;
                let logs = self.invoke(binary, &group, substrate).await?;
                check_group(case, &group, &logs)?;
                outcome.invocations.push(PluginInvocation {
                    version: group.version,
                    binary: binary.clone(),
                    apis: group.apis.len(),
                    logs,
                });
            }
            next_index += command.apis.len();
        }
        Ok(outcome)
    }

    async fn invoke(
        &self,
        binary: &Path,
        group: &VersionGroup<'_>,
        substrate: &Substrate,
    ) -> Result<LogMap> {
        let version = group.version;
        let script = script_yaml(group.apis.iter().map(|(_, api)| *api))?;
        let mut script_file = tempfile::Builder::new()
            .prefix("runtime-apis-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|source| HarnessError::ScriptWrite {
                path: std::env::temp_dir(),
                source,
            })?;
        script_file
            .write_all(script.as_bytes())
            .and_then(|_| script_file.flush())
            .map_err(|source| HarnessError::ScriptWrite {
                path: script_file.path().to_path_buf(),
                source,
            })?;

        let mut process = ProcessCommand::new(binary);
        process
            .arg("test")
            .arg("-f")
            .arg(script_file.path())
            .envs(substrate.env_vars())
            .env(TANZU_CLI_NO_COLOR, "1")
            .env(NO_COLOR, "1")
            .env(TERM, "dumb")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(bin) = std::env::var_os(TANZU_BIN) {
            process.env(TANZU_BIN, bin);
        }

        debug!(
            %version,
            binary = %binary.display(),
            apis = group.apis.len(),
            "spawning plugin"
        );
        let child = process.spawn().map_err(|source| HarnessError::Spawn {
            binary: binary.to_path_buf(),
            source,
        })?;

        // Dropping the wait future drops the child, which kills it.
        let waited = child.wait_with_output();
        let deadline = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, waited)
                    .await
                    .map_err(|_| HarnessError::Timeout { version, timeout }),
                None => Ok(waited.await),
            }
        };
        let waited = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(HarnessError::Cancelled),
            result = deadline => result?,
        };
        let output = waited.map_err(|source| HarnessError::Spawn {
            binary: binary.to_path_buf(),
            source,
        })?;

        if !output.status.success() {
            return Err(HarnessError::PluginFailed {
                version,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !output.stderr.is_empty() {
            debug!(%version, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "plugin diagnostics");
        }
        parse_logs(version, &output.stdout)
    }
}

fn parse_logs(version: RuntimeVersion, stdout: &[u8]) -> Result<LogMap> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(LogMap::new());
    }
    serde_yaml::from_slice(stdout).map_err(|source| HarnessError::LogParse { version, source })
}

/// Pops one log per API in script order and validates it.
fn check_group(case: &TestCase, group: &VersionGroup<'_>, logs: &LogMap) -> Result<()> {
    let mut pending: BTreeMap<RuntimeApiName, VecDeque<&ApiLog>> = logs
        .iter()
        .map(|(name, entries)| (*name, entries.iter().collect()))
        .collect();

    for (index, api) in &group.apis {
        let log = pending
            .get_mut(&api.name)
            .and_then(VecDeque::pop_front)
            .ok_or(HarnessError::MissingLog {
                index: *index,
                api: api.name,
                version: group.version,
            })?;
        validator::validate(api.output.as_ref(), log).map_err(|reason| {
            HarnessError::Validation {
                index: *index,
                api: api.name,
                version: group.version,
                reason,
                expected: api
                    .output
                    .as_ref()
                    .map(|o| o.content.clone())
                    .unwrap_or_default(),
                actual: serde_yaml::to_string(log).unwrap_or_default(),
            }
        })?;
    }

    for (api, rest) in pending.into_iter().filter(|(_, rest)| !rest.is_empty()) {
        if case.validation.is_partial() {
            debug!(%api, count = rest.len(), "ignoring surplus log entries");
        } else {
            return Err(HarnessError::SurplusLog {
                api,
                version: group.version,
                count: rest.len(),
            });
        }
    }
    Ok(())
}
