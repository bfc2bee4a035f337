pub mod arduino;
#[cfg(test)]
pub mod fake;
pub mod fixed;

pub use arduino::SerialSource;
pub use fixed::FixedSource;

use crate::error::Result;

/// Line-oriented command/response link to a device.
pub trait Channel {
    fn write_command(&mut self, command: &str) -> Result<()>;

    /// Reads up to and including the next newline into `buf`.
    /// Returns 0 when the read timed out before any byte arrived.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize>;

    /// Safe to call more than once.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Produces one ordered set of temperature readings per call.
pub trait ReadingSource {
    fn acquire(&mut self) -> Result<Vec<f64>>;
}
