pub mod config;
pub mod entrypoint;
pub mod grants;
pub mod manifest;
pub mod msg;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod schema;

pub use config::{
    ConfigError, ConfigField, ConfigSource, ConfigValue, EnvConfigSource, MapConfigSource,
    ResolvedConfig, resolve,
};
pub use grants::{FileGrantStore, GrantRecord, GrantStore, InMemoryGrantStore};
pub use manifest::{ManifestError, ManifestMeta, ProviderManifest};
pub use msg::{AccessMessage, GrantResult, Request, Response};
pub use provider::{AccessProvider, ProviderError};
pub use registry::{
    RegistryError, Target, TargetDescriptor, TargetError, TargetField, TargetRegistry,
};
pub use runtime::{DispatchError, ProviderRuntime};
pub use schema::{
    ConfigFieldSchema, ProviderSchema, SCHEMA_VERSION, TargetFieldSchema, TargetSchema, schema_id,
};
