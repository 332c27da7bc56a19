use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use accessway_core::config::env_key;
use accessway_core::manifest::{ManifestError, ProviderManifest};
use accessway_core::msg::{AccessMessage, Request};
use accessway_core::registry::Target;
use accessway_core::schema::{SCHEMA_VERSION, schema_id};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::runner::RunnerError;
use crate::scaffold::ScaffoldOptions;

mod envfile;
mod runner;
mod scaffold;

#[derive(Debug, Parser)]
#[command(name = "accessway")]
#[command(about = "Development CLI for accessway access providers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scaffold a new access provider project
    Init {
        #[arg(long)]
        name: String,
        #[arg(long)]
        publisher: String,
        #[arg(long, default_value = "0.1.0")]
        version: String,
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Create a new directory named after the provider
        #[arg(long)]
        create_folder: bool,
    },
    /// Print the schema of a provider binary
    Schema {
        #[arg(long)]
        bin: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Write a .env file with the provider's configuration values
    Configure {
        #[arg(long)]
        bin: Option<PathBuf>,
        /// Configuration value in key=value form; repeat per field
        #[arg(long = "set")]
        set: Vec<String>,
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
    /// Dispatch requests to a provider binary locally
    Test {
        #[command(subcommand)]
        command: TestCommands,
    },
    /// Build a distributable provider artifact in dist/
    Package {
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        bin: Option<PathBuf>,
        #[arg(long, default_value = "https://registry.accessway.dev")]
        registry_url: String,
    },
}

#[derive(Debug, Subcommand)]
enum TestCommands {
    Describe {
        #[arg(long)]
        bin: Option<PathBuf>,
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
    Grant {
        #[arg(long)]
        subject: String,
        /// Target as JSON, e.g. '{"kind":"Environment","arguments":{"environment":"staging"}}'
        #[arg(long)]
        target: String,
        #[arg(long)]
        bin: Option<PathBuf>,
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
    Revoke {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        bin: Option<PathBuf>,
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },
}

fn main() -> Result<(), CliError> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            name,
            publisher,
            version,
            path,
            create_folder,
        } => init_command(name, publisher, version, &path, create_folder),
        Commands::Schema { bin, json } => schema_command(bin, json),
        Commands::Configure { bin, set, env_file } => configure_command(bin, &set, &env_file),
        Commands::Test { command } => match command {
            TestCommands::Describe { bin, env_file } => {
                test_dispatch(bin, &env_file, Request::Describe)
            }
            TestCommands::Grant {
                subject,
                target,
                bin,
                env_file,
            } => {
                let target: Target = serde_json::from_str(&target)?;
                test_dispatch(bin, &env_file, Request::Grant(AccessMessage { subject, target }))
            }
            TestCommands::Revoke {
                subject,
                target,
                bin,
                env_file,
            } => {
                let target: Target = serde_json::from_str(&target)?;
                test_dispatch(bin, &env_file, Request::Revoke(AccessMessage { subject, target }))
            }
        },
        Commands::Package {
            path,
            bin,
            registry_url,
        } => package_command(&path, bin, &registry_url),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(accessway_core::entrypoint::LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn init_command(
    name: String,
    publisher: String,
    version: String,
    path: &Path,
    create_folder: bool,
) -> Result<(), CliError> {
    let target_dir = if create_folder {
        path.join(&name)
    } else {
        path.to_path_buf()
    };

    if !create_folder && target_dir.exists() {
        let mut entries = std::fs::read_dir(&target_dir)?;
        if entries.next().is_some() {
            return Err(CliError::NonEmptyDirectory(target_dir));
        }
    }
    std::fs::create_dir_all(&target_dir)?;

    let options = ScaffoldOptions {
        name,
        publisher,
        version,
    };
    let written = scaffold::scaffold(&target_dir, &options)?;

    println!("Scaffolded a new access provider in {}", target_dir.display());
    for file in &written {
        println!("  {}", file.display());
    }
    println!("Get started by running these commands next:");
    println!("  cargo build");
    println!(
        "  accessway test describe --bin target/debug/{}",
        options.name
    );
    Ok(())
}

fn schema_command(bin: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let bin = resolve_provider_bin(bin, Path::new("."))?;
    let schema = runner::fetch_schema(&bin)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("Provider schema ({})", schema.schema_version);
    if !schema.config.is_empty() {
        println!("Config:");
        for (name, field) in &schema.config {
            let secret = if field.secret { " (secret)" } else { "" };
            match &field.description {
                Some(description) => println!("  {name}{secret}: {description}"),
                None => println!("  {name}{secret}"),
            }
        }
    }
    println!("Targets:");
    for (kind, target) in &schema.targets {
        let fields: Vec<&str> = target.properties.keys().map(String::as_str).collect();
        println!("  {kind}: {}", fields.join(", "));
    }
    Ok(())
}

fn configure_command(
    bin: Option<PathBuf>,
    set: &[String],
    env_file: &Path,
) -> Result<(), CliError> {
    let bin = resolve_provider_bin(bin, Path::new("."))?;
    let schema = runner::fetch_schema(&bin)?;

    let mut provided = BTreeMap::new();
    for pair in set {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::InvalidSetValue(pair.clone()))?;
        provided.insert(key.to_string(), value.to_string());
    }

    for key in provided.keys() {
        if !schema.config.contains_key(key) {
            return Err(CliError::UnknownConfigField(key.clone()));
        }
    }

    let mut values = BTreeMap::new();
    for (name, field) in &schema.config {
        let value = provided
            .get(name)
            .ok_or_else(|| CliError::MissingConfigValue(name.clone()))?;
        values.insert(env_key(name, field.secret), value.clone());
    }

    envfile::write(env_file, &values)?;
    println!("Wrote {} values to {}", values.len(), env_file.display());
    Ok(())
}

fn test_dispatch(
    bin: Option<PathBuf>,
    env_file: &Path,
    request: Request,
) -> Result<(), CliError> {
    let bin = resolve_provider_bin(bin, Path::new("."))?;
    let env = envfile::read(env_file)?;
    let response = runner::run_entrypoint(&bin, &request, &env)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn package_command(path: &Path, bin: Option<PathBuf>, registry_url: &str) -> Result<(), CliError> {
    let manifest = ProviderManifest::load(&path.join(ProviderManifest::FILE_NAME))?;
    let bin = resolve_provider_bin(bin, path)?;
    let schema = runner::fetch_schema(&bin)?;

    let id = schema_id(registry_url, &manifest.publisher, &manifest.name, SCHEMA_VERSION);
    let schema = schema.with_id(id);

    let dist = path.join("dist");
    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    let schema_json = serde_json::to_string_pretty(&schema)?;
    std::fs::write(dist.join("schema.json"), &schema_json)?;

    let packaged = PackagedProvider {
        publisher: manifest.publisher.clone(),
        name: manifest.name.clone(),
        version: manifest.version.clone(),
        schema_version: SCHEMA_VERSION.to_string(),
    };
    let manifest_json = serde_json::to_string_pretty(&packaged)?;
    std::fs::write(dist.join("manifest.json"), &manifest_json)?;

    let archive_path = dist.join("provider.zip");
    write_archive(&archive_path, path, &schema_json, &manifest_json)?;

    println!(
        "packaged {}/{}@{} to {}",
        packaged.publisher,
        packaged.name,
        packaged.version,
        archive_path.display()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct PackagedProvider {
    publisher: String,
    name: String,
    version: String,
    schema_version: String,
}

fn write_archive(
    archive_path: &Path,
    root: &Path,
    schema_json: &str,
    manifest_json: &str,
) -> Result<(), CliError> {
    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);

    for name in [ProviderManifest::FILE_NAME, "Cargo.toml"] {
        let path = root.join(name);
        if path.exists() {
            writer.start_file(name, SimpleFileOptions::default())?;
            writer.write_all(&std::fs::read(&path)?)?;
        }
    }

    add_sources(&mut writer, root, &root.join("src"))?;

    writer.start_file("schema.json", SimpleFileOptions::default())?;
    writer.write_all(schema_json.as_bytes())?;
    writer.start_file("manifest.json", SimpleFileOptions::default())?;
    writer.write_all(manifest_json.as_bytes())?;

    writer.finish()?;
    Ok(())
}

fn add_sources(writer: &mut ZipWriter<File>, root: &Path, dir: &Path) -> Result<(), CliError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            add_sources(writer, root, &path)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs")
            && let Ok(rel) = path.strip_prefix(root)
        {
            let name = rel.to_string_lossy().replace('\\', "/");
            writer.start_file(name, SimpleFileOptions::default())?;
            writer.write_all(&std::fs::read(&path)?)?;
        }
    }
    Ok(())
}

fn resolve_provider_bin(explicit: Option<PathBuf>, dir: &Path) -> Result<PathBuf, CliError> {
    if let Some(bin) = explicit {
        return Ok(bin);
    }

    let manifest_path = dir.join(ProviderManifest::FILE_NAME);
    if manifest_path.exists() {
        let manifest = ProviderManifest::load(&manifest_path)?;
        if let Some(bin) = manifest.bin {
            return Ok(dir.join(bin));
        }
    }

    Err(CliError::NoProviderBinary)
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("no provider binary specified; pass --bin or set bin in provider.toml")]
    NoProviderBinary,
    #[error("refusing to scaffold into non-empty directory {} (pass --create-folder to create a new one)", .0.display())]
    NonEmptyDirectory(PathBuf),
    #[error("invalid --set value {0}: expected key=value")]
    InvalidSetValue(String),
    #[error("unknown config field {0}")]
    UnknownConfigField(String),
    #[error("missing value for config field {0}, pass --set {0}=<value>")]
    MissingConfigValue(String),
}
