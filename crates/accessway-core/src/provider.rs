use crate::config::{ConfigError, ConfigField, ResolvedConfig};
use crate::msg::GrantResult;
use crate::registry::{Target, TargetDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("setup failed: {0}")]
    Setup(String),
    #[error("{0}")]
    Handler(String),
}

impl ProviderError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// The contract an access provider implements. One instance exists per
/// deployment: the host resolves the declared config fields, calls `setup`
/// once, then dispatches `grant` and `revoke` per access request.
///
/// Registration is by implementing the trait: `config_fields` and `targets`
/// are the declarative surface the host reads into its registry and schema.
pub trait AccessProvider {
    /// Configuration fields resolved by the host before `setup` runs.
    fn config_fields(&self) -> Vec<ConfigField> {
        Vec::new()
    }

    /// Target kinds this provider can grant access to.
    fn targets(&self) -> Vec<TargetDescriptor>;

    /// One-time initialization, e.g. constructing API clients. Runs before
    /// any grant or revoke dispatch; a failure makes the provider unusable.
    fn setup(&mut self, _config: &ResolvedConfig) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Grant `subject` access to `target`. The target has already been
    /// validated against the registered descriptor.
    fn grant(&self, subject: &str, target: &Target) -> Result<GrantResult, ProviderError>;

    /// Undo a grant. Must be safe to call when the corresponding grant is
    /// unknown or already absent.
    fn revoke(&self, subject: &str, target: &Target) -> Result<(), ProviderError>;
}
