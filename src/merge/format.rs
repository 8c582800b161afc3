//! Textual formats a configuration file can be written in.

use crate::error::MergeError;
use std::path::Path;

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// YAML, which also accepts JSON documents.
    #[default]
    Yaml,
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl Format {
    /// Detect the format from a file extension.
    ///
    /// - `.yaml`, `.yml` -> YAML
    /// - `.json` -> JSON
    /// - `.toml` -> TOML
    ///
    /// Anything else, including no extension at all, is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    /// Parse raw bytes into a generic document tree.
    ///
    /// Empty or whitespace-only input parses to `Null`.
    pub(crate) fn parse(self, raw: &[u8]) -> Result<serde_json::Value, MergeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| MergeError::ParseError(format!("file is not valid UTF-8: {}", e)))?;

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        match self {
            Self::Yaml => serde_yaml::from_str(text)
                .map_err(|e| MergeError::ParseError(format!("Invalid YAML: {}", e))),
            Self::Json => serde_json::from_str(text)
                .map_err(|e| MergeError::ParseError(format!("Invalid JSON: {}", e))),
            Self::Toml => {
                let value: toml::Value = toml::from_str(text)
                    .map_err(|e| MergeError::ParseError(format!("Invalid TOML: {}", e)))?;
                serde_json::to_value(value)
                    .map_err(|e| MergeError::ParseError(format!("TOML conversion error: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path(&PathBuf::from("mesh.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(&PathBuf::from("mesh.yml")), Format::Yaml);
        assert_eq!(Format::from_path(&PathBuf::from("mesh.json")), Format::Json);
        assert_eq!(Format::from_path(&PathBuf::from("mesh.toml")), Format::Toml);
        assert_eq!(
            Format::from_path(&PathBuf::from("/etc/istio/config/mesh")),
            Format::Yaml
        );
    }

    #[test]
    fn test_parse_empty_is_null() {
        assert_eq!(Format::Yaml.parse(b"  \n").unwrap(), serde_json::Value::Null);
        assert_eq!(Format::Toml.parse(b"").unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_parse_toml() {
        let value = Format::Toml
            .parse(b"trustDomain = \"example.org\"\n[defaultConfig]\nstatusPort = 15021\n")
            .unwrap();
        assert_eq!(value["trustDomain"], "example.org");
        assert_eq!(value["defaultConfig"]["statusPort"], 15021);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Format::Yaml.parse(b"key: [unterminated"),
            Err(MergeError::ParseError(_))
        ));
        assert!(matches!(
            Format::Json.parse(b"{\"a\":"),
            Err(MergeError::ParseError(_))
        ));
        assert!(matches!(
            Format::Yaml.parse(&[0xff, 0xfe]),
            Err(MergeError::ParseError(_))
        ));
    }
}
