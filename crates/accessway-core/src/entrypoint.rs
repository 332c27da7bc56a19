use std::process::ExitCode;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{ConfigError, EnvConfigSource};
use crate::grants::{FileGrantStore, InMemoryGrantStore};
use crate::msg::Request;
use crate::provider::{AccessProvider, ProviderError};
use crate::registry::RegistryError;
use crate::runtime::{DispatchError, ProviderRuntime};

pub const LOG_ENV_VAR: &str = "ACCESSWAY_LOG";

/// Runs a provider binary. Providers call this from `main`:
///
/// ```ignore
/// fn main() -> ExitCode {
///     accessway_core::entrypoint::run(MyProvider::default())
/// }
/// ```
///
/// The binary then speaks the protocol the CLI and the hosting platform
/// use: `<bin> schema` prints the provider schema, and `<bin> run
/// '<payload-json>'` dispatches a request and prints the response. Protocol
/// output goes to stdout, logs to stderr.
pub fn run<P: AccessProvider>(provider: P) -> ExitCode {
    init_logging();
    match execute(provider, std::env::args().skip(1).collect()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum EntrypointError {
    #[error("usage: <provider> schema | <provider> run '<payload-json>'")]
    Usage,
    #[error("failed to parse payload JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to open grant store: {0}")]
    Store(#[from] std::io::Error),
}

fn execute<P: AccessProvider>(provider: P, args: Vec<String>) -> Result<String, EntrypointError> {
    match args.first().map(String::as_str) {
        Some("schema") => {
            let runtime = ProviderRuntime::new(provider, InMemoryGrantStore::default())?;
            Ok(serde_json::to_string_pretty(&runtime.describe())?)
        }
        Some("run") => {
            let payload = args.get(1).ok_or(EntrypointError::Usage)?;
            let request: Request = serde_json::from_str(payload)?;

            let store = FileGrantStore::new(FileGrantStore::default_path())?;
            let mut runtime = ProviderRuntime::new(provider, store)?;
            // describe is pure declaration, so it works without any
            // deployment configuration in the environment
            if !matches!(request, Request::Describe) {
                let source = EnvConfigSource::from_env()?;
                runtime.setup(&source)?;
            }

            let response = runtime.handle(request)?;
            Ok(serde_json::to_string(&response)?)
        }
        _ => Err(EntrypointError::Usage),
    }
}
