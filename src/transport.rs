use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use tracing::{error, info};

/// Delivers a serialized measurement message to the telemetry endpoint.
pub trait Transport {
    fn send(&mut self, message: &str) -> Result<()>;
}

/// Device credentials in the `HostName=..;DeviceId=..;SharedAccessKey=..` form
#[derive(Clone, PartialEq)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_key: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for (index, part) in raw.split(';').map(str::trim).filter(|part| !part.is_empty()).enumerate() {
            // Keys are base64 and may end in '='
            let (key, value) = part.split_once('=').ok_or_else(|| {
                Error::invalid("IOT_CS", format!("segment {} is not Key=Value", index + 1))
            })?;
            match key {
                "HostName" => host_name = Some(value.to_string()),
                "DeviceId" => device_id = Some(value.to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                _ => {}
            }
        }

        let require = |field: Option<String>, name: &str| {
            field
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::invalid("IOT_CS", format!("missing {}", name)))
        };

        Ok(ConnectionString {
            host_name: require(host_name, "HostName")?,
            device_id: require(device_id, "DeviceId")?,
            shared_access_key: require(shared_access_key, "SharedAccessKey")?,
        })
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &"<redacted>")
            .finish()
    }
}

/// Writes each message as one line to the wrapped writer.
pub struct StdoutTransport<W: Write> {
    connection: ConnectionString,
    writer: W,
}

impl StdoutTransport<std::io::Stdout> {
    pub fn new(connection: ConnectionString) -> Self {
        Self::with_writer(connection, std::io::stdout())
    }
}

impl<W: Write> StdoutTransport<W> {
    pub fn with_writer(connection: ConnectionString, writer: W) -> Self {
        info!(
            "Transport ready for device {} on {}",
            connection.device_id, connection.host_name
        );
        StdoutTransport { connection, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for StdoutTransport<W> {
    fn send(&mut self, message: &str) -> Result<()> {
        info!(
            "Delivering {} bytes for device {}",
            message.len(),
            self.connection.device_id
        );
        writeln!(self.writer, "{}", message)
            .and_then(|_| self.writer.flush())
            .map_err(|e| {
                error!("Failed to deliver message: {}", e);
                Error::Transport(e.to_string())
            })
    }
}
