use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The resource an access request points at: a registered kind name plus
/// string arguments matching the kind's declared fields. Created by the
/// host per request and consumed read-only by grant and revoke.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    pub kind: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl Target {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TargetField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declarative shape of a target kind. The host renders request forms from
/// the field list and validates incoming targets against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub kind: String,
    pub fields: Vec<TargetField>,
}

impl TargetDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: TargetField) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate target kind: {0}")]
    DuplicateKind(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("unknown target kind: {0}")]
    UnknownKind(String),
    #[error("target {kind} is missing required field {field}")]
    MissingField { kind: String, field: String },
    #[error("target {kind} has unexpected field {field}")]
    UnexpectedField { kind: String, field: String },
}

/// Explicit mapping from kind name to descriptor. Populated from provider
/// declarations at runtime construction.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    kinds: BTreeMap<String, TargetDescriptor>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: TargetDescriptor) -> Result<(), RegistryError> {
        if self.kinds.contains_key(&descriptor.kind) {
            return Err(RegistryError::DuplicateKind(descriptor.kind));
        }
        self.kinds.insert(descriptor.kind.clone(), descriptor);
        Ok(())
    }

    pub fn descriptor(&self, kind: &str) -> Option<&TargetDescriptor> {
        self.kinds.get(kind)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TargetDescriptor> {
        self.kinds.values()
    }

    pub fn validate(&self, target: &Target) -> Result<(), TargetError> {
        let descriptor = self
            .kinds
            .get(&target.kind)
            .ok_or_else(|| TargetError::UnknownKind(target.kind.clone()))?;

        for field in &descriptor.fields {
            if !target.arguments.contains_key(&field.name) {
                return Err(TargetError::MissingField {
                    kind: target.kind.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let declared: BTreeSet<&str> = descriptor.fields.iter().map(|f| f.name.as_str()).collect();
        for name in target.arguments.keys() {
            if !declared.contains(name.as_str()) {
                return Err(TargetError::UnexpectedField {
                    kind: target.kind.clone(),
                    field: name.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment_descriptor() -> TargetDescriptor {
        TargetDescriptor::new("Environment")
            .field(TargetField::new("environment").with_title("Software Development Environment"))
    }

    #[test]
    fn register_rejects_duplicate_kind() {
        let mut registry = TargetRegistry::new();
        registry
            .register(environment_descriptor())
            .expect("first registration failed");

        let err = registry
            .register(environment_descriptor())
            .expect_err("expected duplicate kind error");
        assert!(matches!(err, RegistryError::DuplicateKind(kind) if kind == "Environment"));
    }

    #[test]
    fn validate_accepts_well_formed_target() {
        let mut registry = TargetRegistry::new();
        registry
            .register(environment_descriptor())
            .expect("registration failed");

        let target = Target::new("Environment").argument("environment", "staging");
        assert_eq!(registry.validate(&target), Ok(()));
    }

    #[test]
    fn validate_rejects_unknown_kind() {
        let registry = TargetRegistry::new();
        let target = Target::new("Database");
        assert_eq!(
            registry.validate(&target),
            Err(TargetError::UnknownKind("Database".to_string()))
        );
    }

    #[test]
    fn validate_rejects_missing_field() {
        let mut registry = TargetRegistry::new();
        registry
            .register(environment_descriptor())
            .expect("registration failed");

        let target = Target::new("Environment");
        assert_eq!(
            registry.validate(&target),
            Err(TargetError::MissingField {
                kind: "Environment".to_string(),
                field: "environment".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_unexpected_field() {
        let mut registry = TargetRegistry::new();
        registry
            .register(environment_descriptor())
            .expect("registration failed");

        let target = Target::new("Environment")
            .argument("environment", "staging")
            .argument("region", "us-west-2");
        assert_eq!(
            registry.validate(&target),
            Err(TargetError::UnexpectedField {
                kind: "Environment".to_string(),
                field: "region".to_string(),
            })
        );
    }
}
