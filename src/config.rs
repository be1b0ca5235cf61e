//! Global configuration for podium

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::render::{Format, LinkMap};

/// Global podium configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default output format
    #[serde(default)]
    pub format: Option<Format>,

    /// Wrap HTML output in a complete page
    #[serde(default)]
    pub standalone: bool,

    /// Treat unresolved references as errors
    #[serde(default)]
    pub strict: bool,

    /// Reference map file (.toml or .yaml)
    #[serde(default)]
    pub links_file: Option<PathBuf>,

    /// Inline reference map entries
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl Config {
    /// Load config from default location (~/.config/podium/config.toml)
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Get default config file path
    /// Checks ~/.config/podium/config.toml first (XDG style),
    /// then falls back to OS-specific location
    pub fn default_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("podium").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podium")
            .join("config.toml")
    }

    /// Build the reference map: the links file first, inline entries override it
    pub fn link_map(&self) -> Result<LinkMap> {
        let mut links = match &self.links_file {
            Some(path) => LinkMap::load(path)?,
            None => LinkMap::new(),
        };

        for (name, location) in &self.links {
            links.insert(name.clone(), location.clone());
        }

        Ok(links)
    }

    /// Create default config file at `path` if it doesn't exist
    pub fn create_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let default_config = r#"# podium configuration

# Default output format: text, html, pod or json
# format = "text"

# Wrap HTML output in a complete page
# standalone = false

# Fail when a cross-reference cannot be resolved
# strict = false

# Reference map file with name = location pairs (.toml or .yaml)
# links_file = "/path/to/links.toml"

# Inline reference map entries
[links]
# "IO::Handle" = "/type/IO::Handle"
"#;

        std::fs::write(path, default_config)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "format = \"html\"\nstandalone = true\n\n[links]\nRoutine = \"/type/Routine\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.format, Some(Format::Html));
        assert!(config.standalone);
        assert!(!config.strict);

        let links = config.link_map().unwrap();
        assert_eq!(links.resolve("Routine"), Some("/type/Routine".to_string()));
    }

    #[test]
    fn test_inline_links_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let links_path = dir.path().join("links.yaml");
        std::fs::write(&links_path, "Mu: /old/Mu\nStr: /type/Str\n").unwrap();

        let mut config = Config {
            links_file: Some(links_path),
            ..Default::default()
        };
        config.links.insert("Mu".to_string(), "/type/Mu".to_string());

        let links = config.link_map().unwrap();
        assert_eq!(links.resolve("Mu"), Some("/type/Mu".to_string()));
        assert_eq!(links.resolve("Str"), Some("/type/Str".to_string()));
    }

    #[test]
    fn test_create_default_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("podium").join("config.toml");

        assert!(Config::create_default(&path).unwrap());
        assert!(!Config::create_default(&path).unwrap());

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.format, None);
        assert!(config.links.is_empty());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "format = \"pdf\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
