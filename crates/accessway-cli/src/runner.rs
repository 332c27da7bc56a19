use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use accessway_core::config::CONFIG_BLOB_VAR;
use accessway_core::msg::{Request, Response};
use accessway_core::schema::ProviderSchema;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to run provider binary {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("provider binary exited with {status}")]
    Failed { status: std::process::ExitStatus },
    #[error("failed to decode provider output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Spawns the provider binary with a wire request and decodes its response.
/// The caller's environment is forwarded as-is, so credentials in the
/// caller's shell are visible to the provider; the `.env` contents ride in
/// the `PROVIDER_CONFIG` variable.
pub fn run_entrypoint(
    bin: &Path,
    request: &Request,
    env: &BTreeMap<String, String>,
) -> Result<Response, RunnerError> {
    let payload = serde_json::to_string(request)?;
    debug!(bin = %bin.display(), payload = %payload, "running provider");

    let mut command = Command::new(bin);
    command.arg("run").arg(&payload).stderr(Stdio::inherit());
    if !env.is_empty() {
        command.env(CONFIG_BLOB_VAR, serde_json::to_string(env)?);
    }

    let output = command.output().map_err(|source| RunnerError::Spawn {
        bin: bin.display().to_string(),
        source,
    })?;
    if !output.status.success() {
        return Err(RunnerError::Failed {
            status: output.status,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!(output = %stdout, "provider output");
    let response = serde_json::from_str(stdout.trim())?;
    Ok(response)
}

pub fn fetch_schema(bin: &Path) -> Result<ProviderSchema, RunnerError> {
    let output = Command::new(bin)
        .arg("schema")
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| RunnerError::Spawn {
            bin: bin.display().to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(RunnerError::Failed {
            status: output.status,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let schema = serde_json::from_str(stdout.trim())?;
    Ok(schema)
}
