//! Reference map - resolves cross-reference names to locations

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

lazy_static! {
    // Targets that already are locations: URLs, absolute paths, anchors
    static ref LOCATION_RE: Regex = Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://|mailto:|/|#)").unwrap();
}

/// Mapping from reference name to target location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkMap {
    entries: BTreeMap<String, String>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, location: impl Into<String>) {
        self.entries.insert(name.into(), location.into());
    }

    /// Add all entries of `other`, overriding existing names
    pub fn merge(&mut self, other: LinkMap) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve a reference target to a location.
    ///
    /// Locations pass through unchanged; `Name#fragment` resolves `Name`
    /// and keeps the fragment.
    pub fn resolve(&self, target: &str) -> Option<String> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }

        if LOCATION_RE.is_match(target) {
            return Some(target.to_string());
        }

        if let Some(location) = self.entries.get(target) {
            return Some(location.clone());
        }

        let (name, fragment) = target.split_once('#')?;
        self.entries
            .get(name.trim())
            .map(|location| format!("{}#{}", location, fragment))
    }

    /// Load a map from a `.toml`, `.yaml` or `.yml` file of `name = location` pairs
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference map: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let map: LinkMap = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse reference map: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse reference map: {}", path.display()))?,
            _ => bail!(
                "Unsupported reference map format '{}' (expected .toml, .yaml or .yml)",
                path.display()
            ),
        };

        Ok(map)
    }

    /// Parse a `name=location` pair as given on the command line
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        let (name, location) = pair
            .split_once('=')
            .with_context(|| format!("Expected name=location, got '{}'", pair))?;

        let name = name.trim();
        let location = location.trim();
        if name.is_empty() || location.is_empty() {
            bail!("Expected name=location, got '{}'", pair);
        }

        Ok((name.to_string(), location.to_string()))
    }
}
