use std::path::{Path, PathBuf};

const CARGO_TOML: &str = include_str!("../templates/Cargo.toml.tmpl");
const MAIN_RS: &str = include_str!("../templates/main.rs.tmpl");
const PROVIDER_TOML: &str = include_str!("../templates/provider.toml.tmpl");
const GITIGNORE: &str = include_str!("../templates/gitignore.tmpl");

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub name: String,
    pub publisher: String,
    pub version: String,
}

pub fn scaffold(dir: &Path, options: &ScaffoldOptions) -> Result<Vec<PathBuf>, std::io::Error> {
    let files = [
        ("Cargo.toml", CARGO_TOML),
        ("provider.toml", PROVIDER_TOML),
        (".gitignore", GITIGNORE),
        ("src/main.rs", MAIN_RS),
    ];

    let mut written = Vec::new();
    for (rel, template) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render(template, options))?;
        written.push(path);
    }
    Ok(written)
}

fn render(template: &str, options: &ScaffoldOptions) -> String {
    template
        .replace("{{name}}", &options.name)
        .replace("{{publisher}}", &options.publisher)
        .replace("{{version}}", &options.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ScaffoldOptions {
        ScaffoldOptions {
            name: "demo-provider".to_string(),
            publisher: "acme".to_string(),
            version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn render_substitutes_all_tokens() {
        for template in [CARGO_TOML, PROVIDER_TOML, MAIN_RS, GITIGNORE] {
            let rendered = render(template, &options());
            assert!(
                !rendered.contains("{{"),
                "unsubstituted token in: {rendered}"
            );
        }
    }

    #[test]
    fn scaffold_writes_project_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let written = scaffold(dir.path(), &options()).expect("scaffold failed");
        assert_eq!(written.len(), 4);

        let manifest =
            std::fs::read_to_string(dir.path().join("provider.toml")).expect("missing manifest");
        assert!(manifest.contains("demo-provider"));
        assert!(manifest.contains("acme"));

        let main_rs =
            std::fs::read_to_string(dir.path().join("src/main.rs")).expect("missing main.rs");
        assert!(main_rs.contains("accessway_core::entrypoint::run"));
    }
}
