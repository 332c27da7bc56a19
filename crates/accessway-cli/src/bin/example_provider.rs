use std::process::ExitCode;

use accessway_core::config::{ConfigField, ResolvedConfig};
use accessway_core::msg::GrantResult;
use accessway_core::provider::{AccessProvider, ProviderError};
use accessway_core::registry::{Target, TargetDescriptor, TargetField};
use tracing::{debug, info};

/// The provider `accessway init` scaffolds, with the configuration fields
/// filled in. Grants access to software development environments; the smoke
/// tests drive it through the CLI.
#[derive(Default)]
struct EnvironmentProvider {
    api_url: Option<String>,
}

impl AccessProvider for EnvironmentProvider {
    fn config_fields(&self) -> Vec<ConfigField> {
        vec![
            ConfigField::new("api_url").with_description("The API URL"),
            ConfigField::new("api_key")
                .with_description("The API key")
                .secret(),
        ]
    }

    fn targets(&self) -> Vec<TargetDescriptor> {
        vec![TargetDescriptor::new("Environment").field(
            TargetField::new("environment").with_title("Software Development Environment"),
        )]
    }

    fn setup(&mut self, config: &ResolvedConfig) -> Result<(), ProviderError> {
        self.api_url = config.get("api_url").map(str::to_string);
        Ok(())
    }

    fn grant(&self, subject: &str, target: &Target) -> Result<GrantResult, ProviderError> {
        info!(subject, ?target, "granting access");
        if let Some(api_url) = &self.api_url {
            debug!(%api_url, "contacting upstream API");
        }

        let environment = target
            .arguments
            .get("environment")
            .cloned()
            .unwrap_or_default();
        Ok(GrantResult::with_instructions(format!(
            "{subject} now has access to the {environment} environment"
        )))
    }

    fn revoke(&self, subject: &str, target: &Target) -> Result<(), ProviderError> {
        info!(subject, ?target, "revoking access");
        Ok(())
    }
}

fn main() -> ExitCode {
    accessway_core::entrypoint::run(EnvironmentProvider::default())
}
