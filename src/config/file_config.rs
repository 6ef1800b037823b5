use anyhow::{Context, Result};
use crate::harvest::ImpactParameters;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Optional TOML configuration. Every value present here overrides the
/// matching command line argument.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub user_agent: Option<String>,
    pub request_timeout_sec: Option<u64>,
    pub harvest_deadline_sec: Option<u64>,
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
    pub harvest_interval_hours: Option<u64>,

    pub rate_limit: Option<RateLimitFileConfig>,
    /// Missing keys keep their default value.
    pub impact: Option<ImpactParameters>,
    /// Upstream URL per platform slug.
    pub sources: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RateLimitFileConfig {
    pub per_minute: Option<u32>,
    pub burst: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
