use std::path::Path;

use serde::{Deserialize, Serialize};

/// Provider project metadata from `provider.toml`, written by the scaffold
/// and read by the packaging and test commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderManifest {
    pub name: String,
    pub publisher: String,
    pub version: String,
    /// Path to the built provider binary, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    #[serde(default)]
    pub meta: ManifestMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProviderManifest {
    pub const FILE_NAME: &'static str = "provider.toml";

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)?;
        let manifest = toml::from_str(&contents)?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parses_full_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(ProviderManifest::FILE_NAME);
        std::fs::write(
            &path,
            r#"
name = "example"
publisher = "acme"
version = "0.1.0"
bin = "target/debug/example"

[meta]
display_name = "Example"
"#,
        )
        .expect("failed to write manifest");

        let manifest = ProviderManifest::load(&path).expect("failed to load manifest");
        assert_eq!(manifest.name, "example");
        assert_eq!(manifest.publisher, "acme");
        assert_eq!(manifest.bin.as_deref(), Some("target/debug/example"));
        assert_eq!(manifest.meta.display_name.as_deref(), Some("Example"));
    }

    #[test]
    fn meta_block_is_optional() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(ProviderManifest::FILE_NAME);
        std::fs::write(&path, "name = \"example\"\npublisher = \"acme\"\nversion = \"0.1.0\"\n")
            .expect("failed to write manifest");

        let manifest = ProviderManifest::load(&path).expect("failed to load manifest");
        assert_eq!(manifest.meta, ManifestMeta::default());
        assert!(manifest.bin.is_none());
    }
}
