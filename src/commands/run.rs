use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::load_harness_config;
use crate::constants::HARNESS_CONFIG;
use crate::error::HarnessError;
use crate::framework::types::ValidationStrategy;
use crate::framework::{Runner, TestCase};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CaseReport {
    file: PathBuf,
    name: String,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    plugin_runs: usize,
}

#[derive(Serialize, Debug)]
struct Summary {
    passed: usize,
    failed: usize,
    cases: Vec<CaseReport>,
}

pub async fn run(
    files: Vec<PathBuf>,
    plugins_dir: Option<PathBuf>,
    timeout: Option<u64>,
    json: bool,
) -> Result<()> {
    let cfg = load_harness_config(Path::new(HARNESS_CONFIG))?;
    let plugins_dir = cfg.plugins_dir(plugins_dir.as_deref());
    let timeout = match timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => cfg.timeout(),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping the running test case");
            on_interrupt.cancel();
        }
    });

    let runner = Runner::new(plugins_dir)
        .with_timeout(timeout)
        .with_cancellation(cancel.clone());

    let mut cases = Vec::new();
    for file in files {
        let report = run_file(&runner, &file, cfg.validation).await;
        if !json {
            match &report.error {
                None => println!("✅ {} ({})", report.name, file.display()),
                Some(e) => println!("❌ {} ({}): {e}", report.name, file.display()),
            }
        }
        cases.push(report);
        if cancel.is_cancelled() {
            break;
        }
    }

    let passed = cases.iter().filter(|c| c.passed).count();
    let failed = cases.len() - passed;
    if json {
        let summary = Summary {
            passed,
            failed,
            cases,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} test cases failed", passed + failed);
    }
    Ok(())
}

async fn run_file(
    runner: &Runner,
    file: &Path,
    forced: Option<ValidationStrategy>,
) -> CaseReport {
    let mut report = CaseReport {
        file: file.to_path_buf(),
        name: file.display().to_string(),
        passed: false,
        error: None,
        plugin_runs: 0,
    };
    let mut case = match TestCase::load(file) {
        Ok(case) => case,
        Err(e) => {
            report.error = Some(e.to_string());
            return report;
        }
    };
    if forced == Some(ValidationStrategy::Exact) {
        case.validation = ValidationStrategy::Exact;
    }
    report.name = case.name.clone();

    match runner.execute(&case).await {
        Ok(outcome) => {
            report.passed = true;
            report.plugin_runs = outcome.invocations.len();
        }
        Err(HarnessError::Cancelled) => report.error = Some("cancelled".to_string()),
        Err(e) => report.error = Some(e.to_string()),
    }
    report
}
