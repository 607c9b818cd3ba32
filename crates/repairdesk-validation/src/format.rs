//! Document loading for schema definitions, configuration and snapshots
//!
//! The format is chosen from the file extension: `json`, `yaml`/`yml` or
//! `toml`.

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{Result, ValidationError};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "toml" => Ok(DocumentFormat::Toml),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unsupported file format: '{}'. Supported formats: json, yaml, yml, toml",
                extension
            ))),
        }
    }

    /// Parse a document in this format
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        match self {
            DocumentFormat::Json => Ok(serde_json::from_str(content)?),
            DocumentFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            DocumentFormat::Toml => Ok(toml::from_str(content)?),
        }
    }
}

/// Read and parse a document, picking the format from the extension
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DocumentFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        ValidationError::FileError(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    format.parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("a.YML")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(&PathBuf::from("a.toml")).unwrap(),
            DocumentFormat::Toml
        );
        assert!(DocumentFormat::from_path(&PathBuf::from("a.ini")).is_err());
    }

    #[test]
    fn test_parse_each_format() {
        let json: BTreeMap<String, u64> = DocumentFormat::Json.parse(r#"{"a": 1}"#).unwrap();
        let yaml: BTreeMap<String, u64> = DocumentFormat::Yaml.parse("a: 1\n").unwrap();
        let toml: BTreeMap<String, u64> = DocumentFormat::Toml.parse("a = 1\n").unwrap();
        assert_eq!(json, yaml);
        assert_eq!(yaml, toml);
    }

    #[test]
    fn test_parse_errors_name_the_format() {
        let err = DocumentFormat::Toml
            .parse::<BTreeMap<String, u64>>("a = \"one\"\n")
            .unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
        assert!(err.to_string().contains("TOML error"));

        let err = DocumentFormat::Json
            .parse::<BTreeMap<String, u64>>("{")
            .unwrap_err();
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document::<BTreeMap<String, u64>>(&PathBuf::from("/nonexistent/x.json"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileError(_)));
    }
}
