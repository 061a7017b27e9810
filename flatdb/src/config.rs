use crate::error::{FlatDbError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a store directory.
///
/// Usually built in code with [`Config::new`], or read from a YAML file:
///
/// ```yaml
/// dir: ./data
/// extension: json
/// pretty: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one document file per entity category
    pub dir: PathBuf,
    /// File extension of document files, without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Write indented JSON
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Config {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Config {
            dir: dir.into(),
            extension: default_extension(),
            pretty: default_pretty(),
        }
    }

    /// Load a config from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a config from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() {
            return Err(FlatDbError::Config("'dir' must not be empty".into()));
        }
        // No path separators or glob metacharacters
        let forbidden = ['/', '\\', '.', '*', '?', '[', ']'];
        if self.extension.is_empty() || self.extension.contains(forbidden) {
            return Err(FlatDbError::Config(format!(
                "Invalid file extension '{}'",
                self.extension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_yaml_str("dir: ./data").unwrap();
        assert_eq!(config, Config::new("./data"));
        assert_eq!(config.extension, "json");
        assert!(config.pretty);
    }

    #[test]
    fn test_full_config() {
        let config =
            Config::from_yaml_str("dir: /tmp/store\nextension: db\npretty: false").unwrap();
        assert_eq!(config.dir, PathBuf::from("/tmp/store"));
        assert_eq!(config.extension, "db");
        assert!(!config.pretty);
    }

    #[test]
    fn test_missing_dir_rejected() {
        let err = Config::from_yaml_str("pretty: true").unwrap_err();
        assert!(matches!(err, FlatDbError::Yaml(_)));
    }

    #[test]
    fn test_bad_extension_rejected() {
        let err = Config::from_yaml_str("dir: data\nextension: a/b").unwrap_err();
        assert!(matches!(err, FlatDbError::Config(_)));
    }

    #[test]
    fn test_glob_extension_rejected() {
        for ext in ["*", "j?on", "[js]on"] {
            let err = Config::new("data").with_extension(ext).validate().unwrap_err();
            assert!(matches!(err, FlatDbError::Config(_)), "accepted '{ext}'");
        }
        let err = Config::from_yaml_str("dir: data\nextension: \"*\"").unwrap_err();
        assert!(matches!(err, FlatDbError::Config(_)));
    }

    #[test]
    fn test_with_extension_strips_dot() {
        let config = Config::new("data").with_extension(".store");
        assert_eq!(config.extension, "store");
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("flatdb.yaml");
        std::fs::write(&path, "dir: records\npretty: false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.dir, PathBuf::from("records"));
        assert!(!config.pretty);
    }
}
