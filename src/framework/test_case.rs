//! Commands, test cases and test-case files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::framework::types::{Api, ValidationStrategy};

/// Ordered APIs meant for one plugin binary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command {
    pub apis: Vec<Api>,
}

impl From<Api> for Command {
    fn from(api: Api) -> Self {
        Command { apis: vec![api] }
    }
}

impl FromIterator<Api> for Command {
    fn from_iter<T: IntoIterator<Item = Api>>(iter: T) -> Self {
        Command {
            apis: iter.into_iter().collect(),
        }
    }
}

/// A test scenario. Commands run in the order they were added.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub name: String,
    /// `exact` additionally rejects log entries nobody asked for.
    #[serde(default)]
    pub validation: ValidationStrategy,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        TestCase {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_validation(mut self, validation: ValidationStrategy) -> Self {
        self.validation = validation;
        self
    }

    pub fn add(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn add_all(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Every API in execution order.
    pub fn apis(&self) -> impl Iterator<Item = &Api> {
        self.commands.iter().flat_map(|cmd| cmd.apis.iter())
    }

    /// Rejects (API, version) pairs no plugin implements.
    pub fn validate(&self) -> Result<()> {
        if self.commands.iter().all(|cmd| cmd.apis.is_empty()) {
            return Err(self.invalid("no APIs to run".to_string()));
        }
        for (index, api) in self.apis().enumerate() {
            if !api.name.is_supported_on(api.version) {
                return Err(self.invalid(format!(
                    "API #{index}: {} API is not supported for the specified runtime version {}",
                    api.name, api.version
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> HarnessError {
        HarnessError::InvalidTestCase {
            name: self.name.clone(),
            reason,
        }
    }

    /// Reads a test-case file. A missing `name` defaults to the file stem.
    pub fn load(path: &Path) -> Result<TestCase> {
        let data = std::fs::read_to_string(path)?;
        let mut case: TestCase = serde_yaml::from_str(&data)?;
        if case.name.is_empty() {
            case.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        case.validate()?;
        Ok(case)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| HarnessError::Serialize {
            what: format!("test case '{}'", self.name),
            source,
        })
    }
}

/// Plugin script for a group of APIs: a YAML sequence of API records.
pub fn script_yaml<'a>(apis: impl IntoIterator<Item = &'a Api>) -> Result<String> {
    let apis: Vec<&Api> = apis.into_iter().collect();
    serde_yaml::to_string(&apis).map_err(|source| HarnessError::Serialize {
        what: "API script".to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::options::env::*;
    use crate::framework::types::{ArgumentKey, RuntimeApiName, RuntimeVersion};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env_case() -> TestCase {
        let set = new_set_env_command(
            &SetEnvInputOptions {
                runtime_version: RuntimeVersion::Latest,
                key: "k".into(),
                value: "v".into(),
            },
            &SetEnvOutputOptions::default(),
        )
        .unwrap();
        let get = new_get_env_command(
            &GetEnvInputOptions {
                runtime_version: RuntimeVersion::V0280,
                key: "k".into(),
            },
            &GetEnvOutputOptions {
                runtime_version: RuntimeVersion::V0280,
                value: Some("v".into()),
                ..Default::default()
            },
        )
        .unwrap();
        TestCase::new("env").add(set).add(get)
    }

    #[test]
    fn test_add_preserves_order() {
        let case = env_case();
        let names: Vec<_> = case.apis().map(|api| api.name).collect();
        assert_eq!(names, vec![RuntimeApiName::SetEnv, RuntimeApiName::GetEnv]);
    }

    #[test]
    fn test_script_round_trip() {
        let case = env_case();
        let script = script_yaml(case.apis()).unwrap();
        let parsed: Vec<Api> = serde_yaml::from_str(&script).unwrap();
        let original: Vec<Api> = case.apis().cloned().collect();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_file_round_trip_and_default_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env-lifecycle.yaml");
        let mut case = env_case();
        case.name.clear();
        std::fs::write(&path, case.to_yaml().unwrap()).unwrap();

        let loaded = TestCase::load(&path).unwrap();
        assert_eq!(loaded.name, "env-lifecycle");
        assert_eq!(loaded.commands, case.commands);
    }

    #[test]
    fn test_load_rejects_unsupported_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "name: bad\ncommands:\n  - - name: SetEnv\n      version: v0.11.6\n      arguments:\n        key: k\n        value: v\n",
        )
        .unwrap();
        let err = TestCase::load(&path).unwrap_err();
        assert!(err.is_construction());
        assert!(err
            .to_string()
            .contains("SetEnv API is not supported for the specified runtime version v0.11.6"));
    }

    #[test]
    fn test_empty_case_is_invalid() {
        assert!(TestCase::new("empty").validate().is_err());
        assert!(TestCase::new("empty")
            .add(Command::default())
            .validate()
            .is_err());
    }

    #[test]
    fn test_command_from_apis() {
        let api = |key: &str| Api {
            name: RuntimeApiName::GetEnv,
            version: RuntimeVersion::Latest,
            arguments: [(ArgumentKey::Key, serde_yaml::Value::from(key))]
                .into_iter()
                .collect(),
            output: None,
        };
        let cmd: Command = vec![api("a"), api("b")].into_iter().collect();
        assert_eq!(cmd.apis.len(), 2);
        assert_eq!(Command::from(api("a")).apis.len(), 1);
    }
}
