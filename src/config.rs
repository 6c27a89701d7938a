//! Configuration parsing for Tablecast.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use chrono_tz::Tz;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::flow::DispatchConfig;
use crate::notify::SmtpConfig;

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "tablecast.db";

/// Error type for configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("SMTP_FROM is required when SMTP_HOST is set")]
    MissingSmtpFrom,
}

/// Runtime settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Data directory for the SQLite database
    #[arg(short, long, env = "TABLECAST_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Log filter (trace, debug, info, warn, error, or a directive list)
    #[arg(long, env = "RUST_LOG", default_value = "info,tablecast=debug")]
    pub log_level: String,

    /// Size of the write channel
    #[arg(long, env = "TABLECAST_WRITE_CHANNEL_SIZE", default_value_t = 256)]
    pub write_channel_size: usize,

    /// Size of the reader connection pool
    #[arg(long, env = "TABLECAST_READER_POOL_SIZE", default_value_t = 8)]
    pub reader_pool_size: u32,

    /// IANA zone used for day boundaries and service buckets
    #[arg(long, env = "TABLECAST_TIMEZONE", default_value = "Europe/Berlin")]
    pub timezone: String,

    /// Number of notification workers
    #[arg(long, env = "TABLECAST_DISPATCH_WORKERS", default_value_t = 4)]
    pub dispatch_workers: usize,

    /// Capacity of the notification queue
    #[arg(long, env = "TABLECAST_DISPATCH_QUEUE_SIZE", default_value_t = 256)]
    pub dispatch_queue_size: usize,

    /// SMTP relay host; notifications are only logged when unset
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// SMTP user name
    #[arg(long, env = "SMTP_USERNAME", default_value = "")]
    pub smtp_username: String,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", default_value = "", hide_env_values = true)]
    pub smtp_password: String,

    /// Sender address for outbound mail
    #[arg(long, env = "SMTP_FROM")]
    pub smtp_from: Option<String>,

    /// Timeout for one SMTP conversation, in seconds
    #[arg(long, env = "TABLECAST_SMTP_TIMEOUT_SECS", default_value_t = 10)]
    pub smtp_timeout_secs: u64,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Parse the configured zone name.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            workers: self.dispatch_workers,
            queue_size: self.dispatch_queue_size,
        }
    }

    /// SMTP settings, or `None` when no relay host is configured.
    pub fn smtp_config(&self) -> Result<Option<SmtpConfig>, ConfigError> {
        let Some(host) = self.smtp_host.as_ref().filter(|h| !h.is_empty()) else {
            return Ok(None);
        };
        let from = self
            .smtp_from
            .clone()
            .filter(|f| !f.is_empty())
            .ok_or(ConfigError::MissingSmtpFrom)?;

        Ok(Some(SmtpConfig {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from,
            timeout: Duration::from_secs(self.smtp_timeout_secs),
        }))
    }

    /// Create a configuration for tests rooted at `data_dir`.
    pub fn test_config(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            log_level: "debug".into(),
            write_channel_size: 16,
            reader_pool_size: 4,
            dispatch_workers: 2,
            dispatch_queue_size: 32,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info,tablecast=debug".into(),
            write_channel_size: 256,
            reader_pool_size: 8,
            timezone: "Europe/Berlin".into(),
            dispatch_workers: 4,
            dispatch_queue_size: 256,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: None,
            smtp_timeout_secs: 10,
            otel_endpoint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.db_path(), PathBuf::from("./data").join(DB_FILE));
        assert!(config.smtp_config().unwrap().is_none());
    }

    #[test]
    fn test_invalid_timezone() {
        let config = Config {
            timezone: "Mars/Olympus".into(),
            ..Config::default()
        };
        assert!(matches!(config.tz(), Err(ConfigError::InvalidTimezone(_))));
    }

    #[test]
    fn test_smtp_requires_sender() {
        let mut config = Config {
            smtp_host: Some("smtp.example.de".into()),
            ..Config::default()
        };
        assert!(matches!(config.smtp_config(), Err(ConfigError::MissingSmtpFrom)));

        config.smtp_from = Some("Yoake <reservierung@example.de>".into());
        let smtp = config.smtp_config().unwrap().unwrap();
        assert_eq!(smtp.host, "smtp.example.de");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.timeout, Duration::from_secs(10));
    }
}
