use super::{Channel, ReadingSource};
use crate::config::SerialConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use serialport::SerialPort;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::time::Duration;
use tracing::{error, info, warn};

/// Command understood by the temps board firmware. Sent without a
/// terminator, the Leonardo sketch reacts to the bare text.
pub const GET_TEMPS: &str = "GET TEMPS";

#[derive(Deserialize)]
struct TempsResponse {
    temps: Vec<f64>,
}

/// Serial link to the board, closed on drop.
pub struct SerialChannel {
    port: Option<Box<dyn SerialPort>>,
    port_path: String,
}

fn not_connected() -> Error {
    Error::Io(std::io::Error::new(
        ErrorKind::NotConnected,
        "Serial port not open",
    ))
}

impl SerialChannel {
    pub fn open(config: &SerialConfig) -> Result<Self> {
        info!(
            "Opening serial port {} at {} baud, read timeout {:?}",
            config.port_path, config.baud_rate, config.read_timeout
        );
        let port = serialport::new(config.port_path.as_str(), config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| {
                error!("Failed to open serial port {}: {}", config.port_path, e);
                Error::from(e)
            })?;
        Ok(SerialChannel {
            port: Some(port),
            port_path: config.port_path.clone(),
        })
    }
}

impl Channel for SerialChannel {
    fn write_command(&mut self, command: &str) -> Result<()> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        port.write_all(command.as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let port = self.port.as_mut().ok_or_else(not_connected)?;
        let start = buf.len();
        let mut reader = BufReader::new(&mut **port);
        match reader.read_until(b'\n', buf) {
            Ok(_) => Ok(buf.len() - start),
            // Whatever arrived before the deadline is the answer
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(buf.len() - start),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Closed serial port {}", self.port_path);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Decodes a `{"temps":[...]}` document into readings.
pub fn parse_temps(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    serde_json::from_str::<TempsResponse>(trimmed)
        .map(|response| response.temps)
        .map_err(|e| {
            warn!("Unexpected response from board: {}", trimmed);
            Error::MalformedResponse(format!("expected {{\"temps\":[...]}}, got '{}': {}", trimmed, e))
        })
}

/// One GET TEMPS exchange on an already opened channel. The channel is
/// closed on every path out of here.
pub fn acquire_readings<C: Channel>(channel: &mut C, config: &SerialConfig) -> Result<Vec<f64>> {
    if !config.settle_delay.is_zero() {
        // The board resets when the port opens
        info!("Waiting {:?} for the board to settle", config.settle_delay);
        std::thread::sleep(config.settle_delay);
    }

    let result = exchange(channel, config.read_timeout);
    channel.close();
    result
}

fn exchange<C: Channel>(channel: &mut C, read_timeout: Duration) -> Result<Vec<f64>> {
    info!("Sending command to board: {}", GET_TEMPS);
    channel.write_command(GET_TEMPS)?;

    let mut line = Vec::new();
    let bytes_read = channel.read_line(&mut line)?;
    if bytes_read == 0 {
        error!("No response from board within {:?}", read_timeout);
        return Err(Error::SerialTimeout {
            timeout: read_timeout,
        });
    }

    let text = std::str::from_utf8(&line)
        .map_err(|e| Error::MalformedResponse(format!("response is not UTF-8: {}", e)))?;
    info!("Received response from board: {}", text.trim());

    let temps = parse_temps(text)?;
    info!("Board reported {} readings", temps.len());
    Ok(temps)
}

/// Temperatures read from the board on a serial port.
pub struct SerialSource {
    config: SerialConfig,
}

impl SerialSource {
    pub fn new(config: SerialConfig) -> Self {
        SerialSource { config }
    }
}

impl ReadingSource for SerialSource {
    fn acquire(&mut self) -> Result<Vec<f64>> {
        let mut channel = SerialChannel::open(&self.config)?;
        acquire_readings(&mut channel, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fake::FakeChannel;

    fn quick_config() -> SerialConfig {
        SerialConfig {
            settle_delay: Duration::ZERO,
            ..SerialConfig::new("/dev/null")
        }
    }

    #[test]
    fn returns_temps_after_single_command() {
        let mut channel = FakeChannel::replying("{\"temps\":[1.1,2.2]}\n");
        let temps = acquire_readings(&mut channel, &quick_config()).unwrap();

        assert_eq!(temps, vec![1.1, 2.2]);
        assert_eq!(channel.writes(), &["GET TEMPS".to_string()]);
        assert_eq!(channel.reads(), 1);
        assert!(!channel.is_open());
    }

    #[test]
    fn silence_is_a_timeout_and_closes_channel() {
        let mut channel = FakeChannel::silent();
        let err = acquire_readings(&mut channel, &quick_config()).unwrap_err();

        assert!(matches!(err, Error::SerialTimeout { timeout } if timeout == Duration::from_secs(5)));
        assert!(!channel.is_open());
        assert_eq!(channel.writes().len(), 1);
        assert_eq!(channel.reads(), 1);
    }

    #[test]
    fn garbage_line_is_malformed() {
        let mut channel = FakeChannel::replying("ERR sensor 2\n");
        let err = acquire_readings(&mut channel, &quick_config()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(!channel.is_open());
    }

    #[test]
    fn missing_temps_field_is_malformed() {
        let mut channel = FakeChannel::replying("{\"temperatures\":[20.5]}\n");
        let err = acquire_readings(&mut channel, &quick_config()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn non_utf8_reply_is_malformed() {
        let mut channel = FakeChannel::new(vec![Ok(vec![0xff, 0xfe, b'\n'])]);
        let err = acquire_readings(&mut channel, &quick_config()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(ref msg) if msg.contains("UTF-8")));
    }

    #[test]
    fn read_error_still_closes_channel() {
        let mut channel = FakeChannel::new(vec![Err(Error::Io(std::io::Error::new(
            ErrorKind::BrokenPipe,
            "unplugged",
        )))]);
        let err = acquire_readings(&mut channel, &quick_config()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!channel.is_open());
    }

    #[test]
    fn reply_without_newline_is_accepted() {
        let mut channel = FakeChannel::replying("{\"temps\":[18.63,22.56,16.56]}");
        let temps = acquire_readings(&mut channel, &quick_config()).unwrap();
        assert_eq!(temps, vec![18.63, 22.56, 16.56]);
    }

    #[test]
    fn settle_delay_is_honoured() {
        let config = SerialConfig {
            settle_delay: Duration::from_millis(20),
            ..SerialConfig::new("/dev/null")
        };
        let mut channel = FakeChannel::replying("{\"temps\":[3.0]}\n");
        let start = std::time::Instant::now();
        acquire_readings(&mut channel, &config).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn opening_missing_port_fails() {
        let config = SerialConfig::new("/dev/this-port-does-not-exist");
        assert!(SerialChannel::open(&config).is_err());
    }
}
