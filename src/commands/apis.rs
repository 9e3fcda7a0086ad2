use anyhow::{anyhow, Result};

use crate::framework::types::{RuntimeApiName, RuntimeVersion};

pub fn run(version: Option<String>) -> Result<()> {
    match version {
        Some(v) => {
            let version: RuntimeVersion = v.parse().map_err(|e: String| anyhow!(e))?;
            println!("APIs supported by {version}:");
            for api in RuntimeApiName::supported_on(version) {
                println!("  {api}");
            }
        }
        None => {
            let header: Vec<&str> = RuntimeVersion::ALL.iter().map(|v| v.as_str()).collect();
            println!("{:<34} {}", "API", header.join("  "));
            for api in RuntimeApiName::ALL {
                let cells: Vec<String> = RuntimeVersion::ALL
                    .iter()
                    .map(|v| {
                        let mark = if api.is_supported_on(*v) { "✓" } else { "-" };
                        format!("{mark:^width$}", width = v.as_str().len())
                    })
                    .collect();
                println!("{:<34} {}", api.as_str(), cells.join("  "));
            }
        }
    }
    Ok(())
}
