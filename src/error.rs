use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Environment variable \"{0}\" not set")]
    MissingConfiguration(String),

    #[error("Invalid value for \"{key}\": {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("Timeout exceeded when reading data ({}s)", .timeout.as_secs_f64())]
    SerialTimeout { timeout: Duration },

    #[error("Malformed response from device: {0}")]
    MalformedResponse(String),

    #[error("Count of labels ({labels}) doesn't match count of measured values ({readings})")]
    LabelCountMismatch { labels: usize, readings: usize },

    #[error("Empty measurements")]
    EmptyReadings,

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
