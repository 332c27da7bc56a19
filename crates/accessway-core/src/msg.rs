use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Target;
use crate::schema::ProviderSchema;

/// Wire request dispatched to a provider process:
/// `{"type": "grant" | "revoke" | "describe", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Request {
    Grant(AccessMessage),
    Revoke(AccessMessage),
    Describe,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessMessage {
    pub subject: String,
    pub target: Target,
}

/// Outcome of a grant, surfaced back to the platform. `state` is opaque
/// handler data; the runtime stores it with the grant record so partial
/// grants can be reconciled later.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GrantResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_instructions: Option<String>,
    #[serde(default)]
    pub state: BTreeMap<String, Value>,
}

impl GrantResult {
    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self {
            access_instructions: Some(instructions.into()),
            state: BTreeMap::new(),
        }
    }
}

/// Wire response from a provider process. Decoding is strict so malformed
/// provider output is caught at the boundary rather than misread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Response {
    Granted { result: GrantResult },
    Revoked,
    Schema { schema: ProviderSchema },
}
