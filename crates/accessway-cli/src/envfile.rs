use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Minimal reader/writer for the `KEY="value"` files `configure` emits.
/// A missing file reads as empty.
pub fn read(path: &Path) -> Result<BTreeMap<String, String>, std::io::Error> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut values = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            values.insert(key.trim().to_string(), value.to_string());
        }
    }
    Ok(values)
}

pub fn write(path: &Path, values: &BTreeMap<String, String>) -> Result<(), std::io::Error> {
    let mut contents = String::new();
    for (key, value) in values {
        let _ = writeln!(contents, "{key}=\"{value}\"");
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");

        let mut values = BTreeMap::new();
        values.insert(
            "PROVIDER_CONFIG_API_URL".to_string(),
            "https://example.com".to_string(),
        );
        values.insert("PROVIDER_SECRET_API_KEY".to_string(), "hunter2".to_string());

        write(&path, &values).expect("write failed");
        let read_back = read(&path).expect("read failed");
        assert_eq!(read_back, values);
    }

    #[test]
    fn read_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let values = read(&dir.path().join(".env")).expect("read failed");
        assert!(values.is_empty());
    }

    #[test]
    fn read_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\n\nKEY=value\n").expect("write failed");

        let values = read(&path).expect("read failed");
        assert_eq!(values.get("KEY").map(String::as_str), Some("value"));
    }
}
