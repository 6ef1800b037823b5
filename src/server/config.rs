use super::RequestsLoggingLevel;
use crate::harvest::ImpactParameters;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Number of entries per platform when the request names none.
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_history_limit: usize,
    pub impact: ImpactParameters,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8000,
            metrics_port: 9091,
            default_limit: 20,
            max_limit: 100,
            default_history_limit: 10,
            impact: ImpactParameters::default(),
        }
    }
}

impl ServerConfig {
    /// The requested limit, or the default, clamped to `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<usize>, default: usize) -> usize {
        requested.unwrap_or(default).clamp(1, self.max_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        let config = ServerConfig::default();

        assert_eq!(config.clamp_limit(None, config.default_limit), 20);
        assert_eq!(config.clamp_limit(Some(0), 20), 1);
        assert_eq!(config.clamp_limit(Some(5), 20), 5);
        assert_eq!(config.clamp_limit(Some(5000), 20), 100);
    }
}
