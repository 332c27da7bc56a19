use tracing::{debug, info};

use crate::config::{self, ConfigSource};
use crate::grants::{GrantRecord, GrantStore, timestamp_label};
use crate::msg::{AccessMessage, GrantResult, Request, Response};
use crate::provider::{AccessProvider, ProviderError};
use crate::registry::{RegistryError, Target, TargetError, TargetRegistry};
use crate::schema::ProviderSchema;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("provider setup has not completed")]
    NotReady,
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The host-side dispatch loop around a provider instance. Owns the target
/// registry built from the provider's declarations and the grant record
/// store, and sequences the lifecycle: `setup` must complete before any
/// grant or revoke is dispatched.
///
/// Dispatch takes `&mut self`; hosts wanting concurrent dispatch supply
/// their own synchronization.
pub struct ProviderRuntime<P, S> {
    provider: P,
    registry: TargetRegistry,
    store: S,
    ready: bool,
}

impl<P, S> ProviderRuntime<P, S>
where
    P: AccessProvider,
    S: GrantStore,
{
    pub fn new(provider: P, store: S) -> Result<Self, RegistryError> {
        let mut registry = TargetRegistry::new();
        for descriptor in provider.targets() {
            registry.register(descriptor)?;
        }
        Ok(Self {
            provider,
            registry,
            store,
            ready: false,
        })
    }

    /// Resolves the declared config fields and runs the provider's one-time
    /// initialization. A failure leaves the runtime unusable.
    pub fn setup(&mut self, source: &dyn ConfigSource) -> Result<(), ProviderError> {
        let fields = self.provider.config_fields();
        let resolved = config::resolve(&fields, source)?;
        debug!(fields = fields.len(), "resolved provider configuration");
        self.provider.setup(&resolved)?;
        self.ready = true;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Schema is static declaration, so describing does not require setup.
    pub fn describe(&self) -> ProviderSchema {
        ProviderSchema::from_declarations(&self.provider.config_fields(), &self.provider.targets())
    }

    pub fn grant(&mut self, subject: &str, target: &Target) -> Result<GrantResult, DispatchError> {
        if !self.ready {
            return Err(DispatchError::NotReady);
        }
        self.registry.validate(target)?;

        info!(subject, kind = %target.kind, "granting access");
        let result = self.provider.grant(subject, target)?;

        self.store.put(GrantRecord {
            subject: subject.to_string(),
            target: target.clone(),
            granted_at: timestamp_label(),
            state: result.state.clone(),
        });
        Ok(result)
    }

    /// Revoke is best-effort: the handler runs even when no grant record
    /// exists, so partially-applied grants can still be torn down.
    pub fn revoke(&mut self, subject: &str, target: &Target) -> Result<(), DispatchError> {
        if !self.ready {
            return Err(DispatchError::NotReady);
        }
        self.registry.validate(target)?;

        if self.store.get(subject, target).is_none() {
            debug!(subject, kind = %target.kind, "no grant record found, revoking anyway");
        }
        info!(subject, kind = %target.kind, "revoking access");
        self.provider.revoke(subject, target)?;

        self.store.delete(subject, target);
        Ok(())
    }

    pub fn handle(&mut self, request: Request) -> Result<Response, DispatchError> {
        match request {
            Request::Describe => Ok(Response::Schema {
                schema: self.describe(),
            }),
            Request::Grant(AccessMessage { subject, target }) => {
                let result = self.grant(&subject, &target)?;
                Ok(Response::Granted { result })
            }
            Request::Revoke(AccessMessage { subject, target }) => {
                self.revoke(&subject, &target)?;
                Ok(Response::Revoked)
            }
        }
    }

    pub fn grants(&self) -> Vec<GrantRecord> {
        self.store.list()
    }

    pub fn into_parts(self) -> (P, S) {
        (self.provider, self.store)
    }
}
