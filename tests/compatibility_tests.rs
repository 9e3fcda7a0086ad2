//! End-to-end scenarios against the real plugin binaries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use runtime_compat::error::HarnessError;
use runtime_compat::framework::options::context::*;
use runtime_compat::framework::options::env::*;
use runtime_compat::framework::options::feature::*;
use runtime_compat::framework::options::metadata::*;
use runtime_compat::framework::options::server::*;
use runtime_compat::framework::options::{ContextOpts, GlobalServerOpts, ServerOpts};
use runtime_compat::framework::types::{RuntimeApiName, RuntimeVersion, ValidationStrategy};
use runtime_compat::framework::{Command, Runner, TestCase};
use runtime_compat::library::types::{ServerType, Target};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn plugins_dir() -> PathBuf {
    Path::new(env!("CARGO_BIN_EXE_runtime-test-plugin-latest"))
        .parent()
        .expect("plugin binary has a parent directory")
        .to_path_buf()
}

/// Runner whose substrate lives in `dir`, so tests can check it is removed.
fn runner(dir: &TempDir) -> Runner {
    Runner::new(plugins_dir())
        .with_substrate_dir(dir.path())
        .with_timeout(Some(Duration::from_secs(60)))
}

fn substrate_is_gone(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

fn context(name: &str, endpoint: &str) -> ContextOpts {
    ContextOpts {
        name: name.into(),
        target: Some(Target::Kubernetes),
        global_opts: Some(GlobalServerOpts {
            endpoint: endpoint.into(),
        }),
        ..Default::default()
    }
}

fn get_context(version: RuntimeVersion, expected: ContextOpts) -> Command {
    new_get_context_command(
        &GetContextInputOptions {
            runtime_version: version,
            context_name: expected.name.clone(),
        },
        &GetContextOutputOptions {
            runtime_version: version,
            context: Some(expected),
            ..Default::default()
        },
    )
    .unwrap()
}

fn get_env(version: RuntimeVersion, key: &str, value: Option<&str>, error: &str) -> Command {
    new_get_env_command(
        &GetEnvInputOptions {
            runtime_version: version,
            key: key.into(),
        },
        &GetEnvOutputOptions {
            runtime_version: version,
            value: value.map(str::to_string),
            error: error.into(),
            ..Default::default()
        },
    )
    .unwrap()
}

fn is_feature_enabled(version: RuntimeVersion, plugin: &str, key: &str, enabled: bool) -> Command {
    new_is_feature_enabled_command(
        &IsFeatureEnabledInputOptions {
            runtime_version: version,
            plugin: plugin.into(),
            key: key.into(),
        },
        &IsFeatureEnabledOutputOptions {
            runtime_version: version,
            enabled: Some(enabled),
            ..Default::default()
        },
    )
    .unwrap()
}

fn settings_enabled(enabled: bool) -> Command {
    new_is_config_metadata_settings_enabled_command(
        &IsConfigMetadataSettingsEnabledInputOptions {
            runtime_version: RuntimeVersion::Latest,
            key: "useUnifiedConfig".into(),
        },
        &IsConfigMetadataSettingsEnabledOutputOptions {
            runtime_version: RuntimeVersion::Latest,
            enabled: Some(enabled),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_set_get_context_across_versions() {
    let ctx = context("c1", "e1");
    let set = new_set_context_command(
        &SetContextInputOptions {
            runtime_version: RuntimeVersion::Latest,
            context: ctx.clone(),
            is_current: false,
        },
        &SetContextOutputOptions::default(),
    )
    .unwrap();
    let case = TestCase::new("set-get-context")
        .add(set)
        .add(get_context(RuntimeVersion::Latest, ctx.clone()))
        .add(get_context(RuntimeVersion::V0280, ctx));

    let dir = TempDir::new().unwrap();
    let outcome = runner(&dir).execute(&case).await.unwrap();
    assert_eq!(outcome.invocations.len(), 3);
    assert_eq!(outcome.invocations[2].version, RuntimeVersion::V0280);
    let body = &outcome.invocations[0].logs[&RuntimeApiName::SetContext][0];
    assert_eq!(body.error, "");
    assert!(substrate_is_gone(&dir));
}

#[tokio::test]
async fn test_legacy_version_reads_context_by_type() {
    let ctx = context("c1", "e1");
    let set = new_set_context_command(
        &SetContextInputOptions {
            runtime_version: RuntimeVersion::V0280,
            context: ctx,
            is_current: true,
        },
        &SetContextOutputOptions {
            runtime_version: RuntimeVersion::V0280,
            ..Default::default()
        },
    )
    .unwrap();
    let legacy_view = ContextOpts {
        name: "c1".into(),
        context_type: Some(runtime_compat::library::types::ContextType::K8s),
        global_opts: Some(GlobalServerOpts {
            endpoint: "e1".into(),
        }),
        ..Default::default()
    };
    let current = new_get_current_context_command(
        &GetCurrentContextInputOptions {
            runtime_version: RuntimeVersion::V0254,
            context_type: Some(runtime_compat::library::types::ContextType::K8s),
            ..Default::default()
        },
        &GetCurrentContextOutputOptions {
            runtime_version: RuntimeVersion::V0254,
            context: Some(legacy_view),
            ..Default::default()
        },
    )
    .unwrap();
    let case = TestCase::new("legacy-context").add(set).add(current);
    let dir = TempDir::new().unwrap();
    runner(&dir).execute(&case).await.unwrap();
}

#[tokio::test]
async fn test_env_lifecycle() {
    let set = new_set_env_command(
        &SetEnvInputOptions {
            runtime_version: RuntimeVersion::Latest,
            key: "k".into(),
            value: "v".into(),
        },
        &SetEnvOutputOptions::default(),
    )
    .unwrap();
    let delete = new_delete_env_command(
        &DeleteEnvInputOptions {
            runtime_version: RuntimeVersion::V0280,
            key: "k".into(),
        },
        &DeleteEnvOutputOptions {
            runtime_version: RuntimeVersion::V0280,
            ..Default::default()
        },
    )
    .unwrap();
    let configurations = new_get_env_configurations_command(
        &GetEnvConfigurationsInputOptions {
            runtime_version: RuntimeVersion::V0254,
        },
        &GetEnvConfigurationsOutputOptions {
            runtime_version: RuntimeVersion::V0254,
            envs: Some(BTreeMap::new()),
            validation_strategy: ValidationStrategy::Exact,
            ..Default::default()
        },
    )
    .unwrap();

    let case = TestCase::new("env-lifecycle")
        .add(set)
        .add(get_env(RuntimeVersion::V0280, "k", Some("v"), ""))
        .add(delete)
        .add(get_env(RuntimeVersion::Latest, "k", None, "not found"))
        .add(configurations);
    let dir = TempDir::new().unwrap();
    runner(&dir).execute(&case).await.unwrap();
}

#[tokio::test]
async fn test_server_schema_evolution() {
    let server = ServerOpts {
        name: "s1".into(),
        server_type: Some(ServerType::ManagementCluster),
        global_opts: Some(GlobalServerOpts {
            endpoint: "e".into(),
        }),
        ..Default::default()
    };
    let set = new_set_server_command(
        &SetServerInputOptions {
            runtime_version: RuntimeVersion::Latest,
            server: server.clone(),
            set_current: true,
        },
        &SetServerOutputOptions::default(),
    )
    .unwrap();
    let get = new_get_server_command(
        &GetServerInputOptions {
            runtime_version: RuntimeVersion::V0116,
            server_name: "s1".into(),
        },
        &GetServerOutputOptions {
            runtime_version: RuntimeVersion::V0116,
            server: Some(server.clone()),
            ..Default::default()
        },
    )
    .unwrap();
    let current = new_get_current_server_command(
        &GetCurrentServerInputOptions {
            runtime_version: RuntimeVersion::V0116,
        },
        &GetCurrentServerOutputOptions {
            runtime_version: RuntimeVersion::V0116,
            server: Some(server),
            ..Default::default()
        },
    )
    .unwrap();
    let case = TestCase::new("server-evolution")
        .add(set)
        .add(get)
        .add(current);
    let dir = TempDir::new().unwrap();
    runner(&dir).execute(&case).await.unwrap();
}

#[tokio::test]
async fn test_feature_flag() {
    let set = new_set_feature_command(
        &SetFeatureInputOptions {
            runtime_version: RuntimeVersion::Latest,
            plugin: "plug".into(),
            key: "f".into(),
            value: "true".into(),
        },
        &SetFeatureOutputOptions::default(),
    )
    .unwrap();
    let delete = new_delete_feature_command(
        &DeleteFeatureInputOptions {
            runtime_version: RuntimeVersion::Latest,
            plugin: "plug".into(),
            key: "f".into(),
        },
        &DeleteFeatureOutputOptions::default(),
    )
    .unwrap();
    let case = TestCase::new("feature-flag")
        .add(set)
        .add(is_feature_enabled(RuntimeVersion::Latest, "plug", "f", true))
        .add(is_feature_enabled(RuntimeVersion::V0116, "", "plug.f", true))
        .add(delete)
        .add(is_feature_enabled(RuntimeVersion::V0116, "", "plug.f", false));
    let dir = TempDir::new().unwrap();
    runner(&dir).execute(&case).await.unwrap();
}

#[tokio::test]
async fn test_metadata_round_trip() {
    let set = new_set_config_metadata_setting_command(
        &SetConfigMetadataSettingInputOptions {
            runtime_version: RuntimeVersion::Latest,
            key: "useUnifiedConfig".into(),
            value: "true".into(),
        },
        &SetConfigMetadataSettingOutputOptions::default(),
    )
    .unwrap();
    let get = new_get_config_metadata_setting_command(
        &GetConfigMetadataSettingInputOptions {
            runtime_version: RuntimeVersion::V0900,
            key: "useUnifiedConfig".into(),
        },
        &GetConfigMetadataSettingOutputOptions {
            runtime_version: RuntimeVersion::V0900,
            value: Some("true".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let unified = new_use_unified_config_command(
        &UseUnifiedConfigInputOptions {
            runtime_version: RuntimeVersion::V102,
        },
        &UseUnifiedConfigOutputOptions {
            runtime_version: RuntimeVersion::V102,
            enabled: Some(true),
            ..Default::default()
        },
    )
    .unwrap();
    let delete = new_delete_config_metadata_setting_command(
        &DeleteConfigMetadataSettingInputOptions {
            runtime_version: RuntimeVersion::Latest,
            key: "useUnifiedConfig".into(),
        },
        &DeleteConfigMetadataSettingOutputOptions::default(),
    )
    .unwrap();
    let case = TestCase::new("metadata")
        .add(set)
        .add(get)
        .add(settings_enabled(true))
        .add(unified)
        .add(delete)
        .add(settings_enabled(false));
    let dir = TempDir::new().unwrap();
    runner(&dir).execute(&case).await.unwrap();
}

#[tokio::test]
async fn test_unsupported_combination_fails_at_construction() {
    let err = new_set_env_command(
        &SetEnvInputOptions {
            runtime_version: RuntimeVersion::V0116,
            key: "k".into(),
            value: "v".into(),
        },
        &SetEnvOutputOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "SetEnv API is not supported for the specified runtime version v0.11.6"
    );
}

#[tokio::test]
async fn test_failed_expectation_reports_index_and_cleans_up() {
    let case = TestCase::new("wrong-value")
        .add(
            new_set_env_command(
                &SetEnvInputOptions {
                    runtime_version: RuntimeVersion::Latest,
                    key: "k".into(),
                    value: "v".into(),
                },
                &SetEnvOutputOptions::default(),
            )
            .unwrap(),
        )
        .add(get_env(RuntimeVersion::Latest, "k", Some("other"), ""));
    let dir = TempDir::new().unwrap();
    let err = runner(&dir).execute(&case).await.unwrap_err();
    match err {
        HarnessError::Validation { index, api, .. } => {
            assert_eq!(index, 1);
            assert_eq!(api, RuntimeApiName::GetEnv);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(substrate_is_gone(&dir));
}

#[tokio::test]
async fn test_mixed_versions_in_one_command() {
    let set = new_set_env_command(
        &SetEnvInputOptions {
            runtime_version: RuntimeVersion::V0280,
            key: "k".into(),
            value: "v".into(),
        },
        &SetEnvOutputOptions {
            runtime_version: RuntimeVersion::V0280,
            ..Default::default()
        },
    )
    .unwrap();
    let mixed: Command = set
        .apis
        .into_iter()
        .chain(get_env(RuntimeVersion::Latest, "k", Some("v"), "").apis)
        .chain(get_env(RuntimeVersion::V0280, "k", Some("v"), "").apis)
        .collect();
    let case = TestCase::new("mixed").add(mixed);
    let dir = TempDir::new().unwrap();
    let outcome = runner(&dir).execute(&case).await.unwrap();
    assert_eq!(outcome.invocations.len(), 2);
    assert_eq!(outcome.invocations[0].version, RuntimeVersion::V0280);
    assert_eq!(outcome.invocations[0].apis, 2);
}

#[tokio::test]
async fn test_cancelled_run_cleans_up() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let case = TestCase::new("cancelled").add(get_env(RuntimeVersion::Latest, "k", None, ""));
    let dir = TempDir::new().unwrap();
    let err = runner(&dir)
        .with_cancellation(cancel)
        .execute(&case)
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Cancelled));
    assert!(substrate_is_gone(&dir));
}
