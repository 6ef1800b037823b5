mod file_config;

pub use file_config::{FileConfig, RateLimitFileConfig};

use crate::collectors::DEFAULT_USER_AGENT;
use crate::harvest::ImpactParameters;
use crate::rate_limiter::RateLimitConfig;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub request_timeout_sec: u64,
    pub harvest_deadline_sec: u64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub harvest_interval_hours: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let rate_limit = RateLimitConfig::default();
        Self {
            db_path: None,
            port: 8000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            rate_limit_per_minute: rate_limit.rate_per_minute,
            rate_limit_burst: rate_limit.burst,
            request_timeout_sec: 15,
            harvest_deadline_sec: 30,
            default_limit: 20,
            max_limit: 100,
            harvest_interval_hours: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub rate_limit: RateLimitConfig,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub harvest_deadline: Duration,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Zero disables the periodic harvest.
    pub harvest_interval_hours: u64,
    pub sources: HashMap<String, String>,
    pub impact: ImpactParameters,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and an optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let rate_limit_file = file.rate_limit.unwrap_or_default();
        let rate_limit = RateLimitConfig {
            rate_per_minute: rate_limit_file
                .per_minute
                .unwrap_or(cli.rate_limit_per_minute),
            burst: rate_limit_file.burst.unwrap_or(cli.rate_limit_burst),
        };
        if rate_limit.rate_per_minute == 0 || rate_limit.burst == 0 {
            bail!("Rate limit and burst must both be at least 1");
        }

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);
        let harvest_deadline_sec = file
            .harvest_deadline_sec
            .unwrap_or(cli.harvest_deadline_sec);
        if request_timeout_sec == 0 || harvest_deadline_sec == 0 {
            bail!("Request timeout and harvest deadline must be positive");
        }

        let max_limit = file.max_limit.unwrap_or(cli.max_limit);
        let default_limit = file.default_limit.unwrap_or(cli.default_limit);
        if max_limit == 0 {
            bail!("max_limit must be at least 1");
        }
        if default_limit == 0 || default_limit > max_limit {
            bail!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                max_limit,
                default_limit
            );
        }

        let impact = file.impact.unwrap_or_default();
        impact.validate().map_err(|msg| anyhow::anyhow!(msg))?;

        Ok(Self {
            db_path,
            port: file.port.unwrap_or(cli.port),
            metrics_port: file.metrics_port.unwrap_or(cli.metrics_port),
            logging_level,
            rate_limit,
            user_agent: file
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            request_timeout: Duration::from_secs(request_timeout_sec),
            harvest_deadline: Duration::from_secs(harvest_deadline_sec),
            default_limit,
            max_limit,
            harvest_interval_hours: file
                .harvest_interval_hours
                .unwrap_or(cli.harvest_interval_hours),
            sources: file.sources.unwrap_or_default(),
            impact,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
