use crate::error::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default route of the viewer page
pub const DEFAULT_INDEX_PAGE: &str = "/docs/index.html";

/// Default route of the JSON document
pub const DEFAULT_API_JSON: &str = "/docs/data.json";

/// Documentation settings
///
/// Loaded from a YAML or JSON file. Every key is optional; `enable` left out
/// means the documentation routes are not mounted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsConfig {
    pub enable: bool,
    pub host: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Route serving the viewer page
    pub index_page: String,
    /// Route serving the document JSON
    pub api_json: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            host: None,
            title: None,
            version: None,
            description: None,
            index_page: DEFAULT_INDEX_PAGE.to_string(),
            api_json: DEFAULT_API_JSON.to_string(),
        }
    }
}

impl DocsConfig {
    /// Enabled configuration with every other setting at its default
    pub fn enabled() -> Self {
        Self {
            enable: true,
            ..Self::default()
        }
    }

    /// Load settings from a file.
    ///
    /// YAML is a superset of JSON, so one parser covers both.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading docs config from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| Error::ConfigError {
            file: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Replace settings with the ones given on the command line
    pub fn override_with(
        &mut self,
        host: Option<String>,
        title: Option<String>,
        version: Option<String>,
        description: Option<String>,
    ) {
        if host.is_some() {
            self.host = host;
        }
        if title.is_some() {
            self.title = title;
        }
        if version.is_some() {
            self.version = version;
        }
        if description.is_some() {
            self.description = description;
        }
    }
}
