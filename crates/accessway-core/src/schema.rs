use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigField;
use crate::registry::TargetDescriptor;

pub const SCHEMA_VERSION: &str = "v1";

/// The schema document describing a provider's configuration and targets.
/// The platform registry indexes providers by it; serialization is
/// deterministic so published schemas diff cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderSchema {
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_version: String,
    #[serde(default)]
    pub config: BTreeMap<String, ConfigFieldSchema>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigFieldSchema {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub secret: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, TargetFieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetFieldSchema {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProviderSchema {
    pub fn from_declarations(config: &[ConfigField], targets: &[TargetDescriptor]) -> Self {
        let config = config
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    ConfigFieldSchema {
                        field_type: "string".to_string(),
                        description: field.description.clone(),
                        secret: field.secret,
                    },
                )
            })
            .collect();

        let targets = targets
            .iter()
            .map(|descriptor| {
                let properties = descriptor
                    .fields
                    .iter()
                    .map(|field| {
                        (
                            field.name.clone(),
                            TargetFieldSchema {
                                field_type: "string".to_string(),
                                title: field.title.clone(),
                                description: field.description.clone(),
                            },
                        )
                    })
                    .collect();
                (descriptor.kind.clone(), TargetSchema { properties })
            })
            .collect();

        Self {
            id: None,
            schema_version: SCHEMA_VERSION.to_string(),
            config,
            targets,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The `$id` attached to a packaged schema:
/// `<base>/schema/<publisher>/<name>/<schema_version>`.
pub fn schema_id(base_url: &str, publisher: &str, name: &str, schema_version: &str) -> String {
    format!(
        "{}/schema/{}/{}/{}",
        base_url.trim_end_matches('/'),
        publisher,
        name,
        schema_version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TargetField;

    #[test]
    fn schema_from_declarations() {
        let config = vec![
            ConfigField::new("api_url").with_description("The API URL"),
            ConfigField::new("api_key").with_description("The API key").secret(),
        ];
        let targets = vec![
            TargetDescriptor::new("Environment").field(
                TargetField::new("environment").with_title("Software Development Environment"),
            ),
        ];

        let schema = ProviderSchema::from_declarations(&config, &targets);
        assert_eq!(schema.schema_version, SCHEMA_VERSION);
        assert!(schema.config["api_key"].secret);
        assert!(!schema.config["api_url"].secret);
        assert_eq!(
            schema.targets["Environment"].properties["environment"]
                .title
                .as_deref(),
            Some("Software Development Environment")
        );
    }

    #[test]
    fn schema_serialization_is_deterministic() {
        let config = vec![ConfigField::new("zeta"), ConfigField::new("alpha")];
        let schema = ProviderSchema::from_declarations(&config, &[]);

        let serialized = serde_json::to_string(&schema).expect("failed to serialize schema");
        let alpha_pos = serialized.find("\"alpha\"").expect("missing alpha");
        let zeta_pos = serialized.find("\"zeta\"").expect("missing zeta");
        assert!(alpha_pos < zeta_pos, "expected deterministic key ordering");
    }

    #[test]
    fn schema_id_format() {
        assert_eq!(
            schema_id("https://registry.accessway.dev/", "acme", "example", "v1"),
            "https://registry.accessway.dev/schema/acme/example/v1"
        );
    }
}
