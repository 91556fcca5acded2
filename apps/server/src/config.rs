//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::time::Duration;

use vela_engine::{EmailConfig, EngineConfig, ReservationMode, SmsConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database path
    pub database_path: String,

    /// Checkout behavior on reservation failure ("legacy" or "strict")
    pub reservation_mode: ReservationMode,

    /// Stock threshold for low-stock warnings
    pub low_stock_threshold: i64,

    /// Dedup window for repeat warnings, in seconds
    pub dedup_window_secs: i64,

    /// Notification delivery queue capacity
    pub queue_capacity: usize,

    /// Email transport (None = logged skip)
    pub email: Option<EmailConfig>,

    /// SMS transport (None = logged skip)
    pub sms: Option<SmsConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let config = ServerConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "vela.db".to_string()),

            reservation_mode: env::var("RESERVATION_MODE")
                .map(|v| ReservationMode::parse(&v))
                .unwrap_or_default(),

            low_stock_threshold: env::var("LOW_STOCK_THRESHOLD")
                .unwrap_or_else(|_| defaults.low_stock_threshold.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOW_STOCK_THRESHOLD".to_string()))?,

            dedup_window_secs: env::var("LOW_STOCK_DEDUP_SECS")
                .unwrap_or_else(|_| defaults.dedup_window_secs.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOW_STOCK_DEDUP_SECS".to_string()))?,

            queue_capacity: env::var("NOTIFY_QUEUE_CAPACITY")
                .unwrap_or_else(|_| defaults.queue_capacity.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NOTIFY_QUEUE_CAPACITY".to_string()))?,

            email: load_email()?,
            sms: load_sms()?,
        };

        Ok(config)
    }

    /// The engine-facing slice of this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            reservation_mode: self.reservation_mode,
            low_stock_threshold: self.low_stock_threshold,
            dedup_window_secs: self.dedup_window_secs,
            queue_capacity: self.queue_capacity,
            email: self.email.clone(),
            sms: self.sms.clone(),
            ..EngineConfig::default()
        }
    }
}

/// Email is configured only when all three of EMAIL_ENDPOINT, EMAIL_API_KEY
/// and EMAIL_RECIPIENT are set; a partial set is a configuration error.
fn load_email() -> Result<Option<EmailConfig>, ConfigError> {
    let endpoint = env::var("EMAIL_ENDPOINT").ok();
    let api_key = env::var("EMAIL_API_KEY").ok();
    let recipient = env::var("EMAIL_RECIPIENT").ok();

    match (endpoint, api_key, recipient) {
        (None, None, None) => Ok(None),
        (Some(endpoint), Some(api_key), Some(recipient)) => {
            let mut config = EmailConfig::new(endpoint, api_key, recipient);
            if let Ok(secs) = env::var("EMAIL_TIMEOUT_SECS") {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("EMAIL_TIMEOUT_SECS".to_string()))?;
                config.timeout = Duration::from_secs(secs);
            }
            Ok(Some(config))
        }
        _ => Err(ConfigError::PartialTransport("email")),
    }
}

/// Same rule as [`load_email`], for SMS_ENDPOINT / SMS_API_KEY / SMS_RECIPIENT.
fn load_sms() -> Result<Option<SmsConfig>, ConfigError> {
    let endpoint = env::var("SMS_ENDPOINT").ok();
    let api_key = env::var("SMS_API_KEY").ok();
    let recipient = env::var("SMS_RECIPIENT").ok();

    match (endpoint, api_key, recipient) {
        (None, None, None) => Ok(None),
        (Some(endpoint), Some(api_key), Some(recipient)) => {
            let mut config = SmsConfig::new(endpoint, api_key, recipient);
            if let Ok(secs) = env::var("SMS_TIMEOUT_SECS") {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("SMS_TIMEOUT_SECS".to_string()))?;
                config.timeout = Duration::from_secs(secs);
            }
            Ok(Some(config))
        }
        _ => Err(ConfigError::PartialTransport("sms")),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Incomplete {0} transport configuration: endpoint, api key and recipient must all be set")]
    PartialTransport(&'static str),
}
