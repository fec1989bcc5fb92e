//! Site configuration (_config.yml / _config.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::{DefaultZone, UnknownKeys};

/// Config file names, in lookup order
pub const CONFIG_FILES: &[&str] = &["_config.yml", "_config.yaml", "_config.toml"];

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Directory
    pub source_dir: String,
    pub extensions: Vec<String>,

    // Validation
    /// Zone for dates written without an offset: `-05:00` or an IANA name
    pub timezone: Option<String>,
    pub unknown_keys: UnknownKeys,
    pub warnings_as_errors: bool,

    // Writing
    pub new_post_name: String,
    pub default_layout: String,

    // Date format used by `list`
    pub date_format: String,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_dir: "_posts".to_string(),
            extensions: vec!["md".to_string(), "markdown".to_string()],

            timezone: None,
            unknown_keys: UnknownKeys::Preserve,
            warnings_as_errors: false,

            new_post_name: ":year-:month-:day-:title.md".to_string(),
            default_layout: "post".to_string(),

            date_format: "YYYY-MM-DD".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML or TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {:?}", path))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML in {:?}", path))?,
        };
        Ok(config)
    }

    /// Find the first config file present in `base_dir`
    pub fn locate<P: AsRef<Path>>(base_dir: P) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| base_dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// The configured default zone, if any
    pub fn default_zone(&self) -> Result<Option<DefaultZone>> {
        match &self.timezone {
            None => Ok(None),
            Some(tz) if tz.trim().is_empty() => Ok(None),
            Some(tz) => DefaultZone::parse(tz)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("Unknown timezone in config: {}", tz)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "_posts");
        assert_eq!(config.unknown_keys, UnknownKeys::Preserve);
        assert!(config.default_zone().unwrap().is_none());
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
source_dir: posts
timezone: America/New_York
unknown_keys: reject
warnings_as_errors: true
title: My Swift Blog
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source_dir, "posts");
        assert_eq!(config.unknown_keys, UnknownKeys::Reject);
        assert!(config.warnings_as_errors);
        assert!(config.extra.contains_key("title"));
        assert!(matches!(
            config.default_zone().unwrap(),
            Some(DefaultZone::Named(_))
        ));
        // untouched defaults survive
        assert_eq!(config.default_layout, "post");
    }

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_config.toml");
        fs::write(&path, "timezone = \"-05:00\"\nextensions = [\"md\"]\n").unwrap();

        assert_eq!(SiteConfig::locate(tmp.path()), Some(path.clone()));
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.extensions, vec!["md"]);
        assert!(matches!(
            config.default_zone().unwrap(),
            Some(DefaultZone::Fixed(_))
        ));
    }

    #[test]
    fn test_bad_timezone() {
        let config = SiteConfig {
            timezone: Some("Nowhere/Special".to_string()),
            ..Default::default()
        };
        assert!(config.default_zone().is_err());
    }
}
