use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub base_url: String,
    pub description: String,
    pub author: String,
    pub author_link: String,
    pub year: String,
    pub language: String,
    pub rss_language: String,
    pub cutoff: i64,
    pub journal_command: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

impl Config {
    /// Loads JSON configuration from `path`, or returns the built-in
    /// defaults when no path was supplied. A missing or malformed file is
    /// fatal; absence of the flag is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("{}: invalid JSON", path.display()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Ashley Robin's Journal".to_string(),
            base_url: "https://localhost".to_string(),
            description: "Write a bit about your website here.".to_string(),
            author: "Ashley Robin".to_string(),
            author_link: "https://localhost/arobin".to_string(),
            year: "2023".to_string(),
            language: "en".to_string(),
            rss_language: "en-gb".to_string(),
            cutoff: -1,
            journal_command: "jrnl".to_string(),
            extra: serde_json::Map::new(),
        }
    }
}
