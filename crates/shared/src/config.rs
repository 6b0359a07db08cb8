//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Report pipeline configuration.
    #[serde(default)]
    pub reports: ReportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Report pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Root directory for generated report artifacts.
    #[serde(default = "default_artifact_root")]
    pub artifact_root: String,
    /// Time-to-live for report job tickets, in seconds.
    ///
    /// Must cover generation plus a reasonable client download window.
    #[serde(default = "default_job_ttl")]
    pub job_ttl_secs: u64,
    /// Maximum number of job tickets kept in the status store.
    #[serde(default = "default_job_capacity")]
    pub job_capacity: u64,
}

fn default_artifact_root() -> String {
    "./storage/reports".to_string()
}

fn default_job_ttl() -> u64 {
    10_800 // 3 hours
}

fn default_job_capacity() -> u64 {
    512
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            artifact_root: default_artifact_root(),
            job_ttl_secs: default_job_ttl(),
            job_capacity: default_job_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CANEBOOKS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_config_defaults() {
        let cfg = ReportConfig::default();
        assert_eq!(cfg.artifact_root, "./storage/reports");
        assert_eq!(cfg.job_ttl_secs, 10_800);
        assert_eq!(cfg.job_capacity, 512);
    }

    #[test]
    fn test_report_ttl_within_observed_window() {
        // The polling contract expects tickets to survive between 2 and 6 hours.
        let cfg = ReportConfig::default();
        assert!(cfg.job_ttl_secs >= 7_200);
        assert!(cfg.job_ttl_secs <= 21_600);
    }
}
