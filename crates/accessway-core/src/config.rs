use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable holding a JSON object of configuration values,
/// keyed by the same names as the individual variables. The development
/// runner uses this channel to forward a `.env` file to a provider process.
pub const CONFIG_BLOB_VAR: &str = "PROVIDER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub secret: bool,
}

impl ConfigField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            secret: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Environment variable name for a config field, e.g. `api_url` becomes
/// `PROVIDER_CONFIG_API_URL`, or `PROVIDER_SECRET_API_URL` when secret.
pub fn env_key(name: &str, secret: bool) -> String {
    let prefix = if secret {
        "PROVIDER_SECRET_"
    } else {
        "PROVIDER_CONFIG_"
    };
    format!("{}{}", prefix, name.to_uppercase())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value for field {0}")]
    MissingField(String),
    #[error("PROVIDER_CONFIG is not a JSON object of strings: {0}")]
    InvalidBlob(#[from] serde_json::Error),
}

pub trait ConfigSource {
    fn lookup(&self, field: &ConfigField) -> Option<String>;
}

/// Resolves config fields from the process environment: individual
/// `PROVIDER_CONFIG_*` / `PROVIDER_SECRET_*` variables take precedence over
/// entries of the same name inside the `PROVIDER_CONFIG` JSON blob.
#[derive(Debug, Default)]
pub struct EnvConfigSource {
    blob: BTreeMap<String, String>,
}

impl EnvConfigSource {
    pub fn from_env() -> Result<Self, ConfigError> {
        let blob = match std::env::var(CONFIG_BLOB_VAR) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(_) => BTreeMap::new(),
        };
        Ok(Self { blob })
    }
}

impl ConfigSource for EnvConfigSource {
    fn lookup(&self, field: &ConfigField) -> Option<String> {
        let key = env_key(&field.name, field.secret);
        if let Ok(value) = std::env::var(&key) {
            return Some(value);
        }
        self.blob.get(&key).cloned()
    }
}

/// In-memory source keyed by bare field name, for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MapConfigSource {
    values: BTreeMap<String, String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn lookup(&self, field: &ConfigField) -> Option<String> {
        self.values.get(&field.name).cloned()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConfigValue {
    value: String,
    secret: bool,
}

impl ConfigValue {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            f.write_str("<redacted>")
        } else {
            fmt::Debug::fmt(&self.value, f)
        }
    }
}

/// Configuration resolved by the host before `setup` runs. Providers read
/// values by field name; declared fields are always present.
#[derive(Debug, Default)]
pub struct ResolvedConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl ResolvedConfig {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(ConfigValue::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn resolve(
    fields: &[ConfigField],
    source: &dyn ConfigSource,
) -> Result<ResolvedConfig, ConfigError> {
    let mut values = BTreeMap::new();
    for field in fields {
        let value = source
            .lookup(field)
            .ok_or_else(|| ConfigError::MissingField(field.name.clone()))?;
        values.insert(
            field.name.clone(),
            ConfigValue {
                value,
                secret: field.secret,
            },
        );
    }
    Ok(ResolvedConfig { values })
}
