use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReloadError;
use super::{HotReloadErrorContext, HotReloadResult};

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(ConfigFormat::Json),
            Some("toml") => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Hot-reload configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotReloadConfig {
    /// Module roots to scan
    pub roots: Vec<PathBuf>,

    /// File extensions treated as modules
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    pub recursive: bool,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from("systems/")],
            extensions: vec!["systems".to_string()],
            recursive: true,
        }
    }
}

impl HotReloadConfig {
    /// Load configuration from a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> HotReloadResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ReloadError::UnknownConfigFormat {
            path: path.to_path_buf(),
        })?;

        let raw = std::fs::read_to_string(path).hot_reload_context("config")?;
        let config = match format {
            ConfigFormat::Json => Self::from_json_str(&raw)?,
            ConfigFormat::Toml => Self::from_toml_str(&raw)?,
        };

        log::info!(
            "[HotReloadConfig] Loaded {} root(s) from {}",
            config.roots.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> HotReloadResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> HotReloadResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("reload.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("reload.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("reload.yaml")), None);
    }

    #[test]
    fn test_toml_fills_defaults() {
        let config = HotReloadConfig::from_toml_str(r#"roots = ["game/systems", "mods"]"#).unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("game/systems"), PathBuf::from("mods")]);
        assert_eq!(config.extensions, vec!["systems"]);
        assert!(config.recursive);
    }

    #[test]
    fn test_load_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reload.json");
        fs::write(&path, r#"{"roots": ["a"], "extensions": ["sys"], "recursive": false}"#).unwrap();

        let config = HotReloadConfig::load(&path).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("a")]);
        assert_eq!(config.extensions, vec!["sys"]);
        assert!(!config.recursive);
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let result = HotReloadConfig::load("reload.ini");
        assert!(matches!(result, Err(ReloadError::UnknownConfigFormat { .. })));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            HotReloadConfig::from_toml_str("roots = ["),
            Err(ReloadError::Toml(_))
        ));
    }
}
