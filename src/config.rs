use crate::error::{Error, Result};
use crate::transport::ConnectionString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const ENV_CONNECTION_STRING: &str = "IOT_CS";
pub const ENV_LABELS: &str = "IOT_LABELS";
pub const ENV_SOURCE: &str = "IOT_SOURCE";
pub const ENV_PORT: &str = "IOT_PORT";
pub const ENV_SETTLE_MS: &str = "IOT_SETTLE_MS";
pub const ENV_LOG_DIR: &str = "IOT_LOG_DIR";

/// Serial line settings for the temperature board
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    pub port_path: String,        // e.g. /dev/ttyACM0
    pub baud_rate: u32,           // Fixed in the board firmware
    pub read_timeout: Duration,   // Reading all sensors takes a while
    pub settle_delay: Duration,   // Pause after opening before the first command
}

impl SerialConfig {
    pub fn new(port_path: impl Into<String>) -> Self {
        Self {
            port_path: port_path.into(),
            baud_rate: 9600,
            read_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Where readings come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Static,
    Serial(SerialConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub connection: ConnectionString,
    pub labels: Option<String>,
    pub source: SourceConfig,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a key lookup, failing on the first
    /// required key that is absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_cs = lookup(ENV_CONNECTION_STRING)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::MissingConfiguration(ENV_CONNECTION_STRING.into()))?;
        let connection = ConnectionString::parse(&raw_cs)?;

        // Present but empty counts as not set
        let labels = lookup(ENV_LABELS).filter(|value| !value.trim().is_empty());

        let source = match lookup(ENV_SOURCE).as_deref().map(str::trim) {
            None | Some("") | Some("serial") => {
                let port_path = lookup(ENV_PORT)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| Error::MissingConfiguration(ENV_PORT.into()))?;
                let mut serial = SerialConfig::new(port_path);
                if let Some(raw) = lookup(ENV_SETTLE_MS) {
                    let millis = raw.trim().parse::<u64>().map_err(|e| {
                        Error::invalid(ENV_SETTLE_MS, format!("'{}' is not a number of milliseconds: {}", raw, e))
                    })?;
                    serial.settle_delay = Duration::from_millis(millis);
                }
                SourceConfig::Serial(serial)
            }
            Some("static") => SourceConfig::Static,
            Some(other) => {
                return Err(Error::invalid(
                    ENV_SOURCE,
                    format!("expected 'serial' or 'static', got '{}'", other),
                ));
            }
        };

        let log_dir = lookup(ENV_LOG_DIR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));

        info!(
            "Configuration loaded: device {} on {}, source {:?}, labels {}",
            connection.device_id,
            connection.host_name,
            source,
            if labels.is_some() { "set" } else { "not set" }
        );

        Ok(Config {
            connection,
            labels,
            source,
            log_dir,
        })
    }
}
