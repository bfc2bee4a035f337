pub mod labels;
pub mod message;

use crate::devices::ReadingSource;
use crate::error::{Error, Result};
use crate::transport::Transport;
use labels::resolve_labels;
use message::build_message;
use tracing::{error, info};

/// Acquire, label, build and send one message. Returns the text that
/// was sent; nothing is sent when any step fails.
pub fn run_cycle<S, T>(labels_text: Option<&str>, source: &mut S, transport: &mut T) -> Result<String>
where
    S: ReadingSource + ?Sized,
    T: Transport + ?Sized,
{
    info!("Acquiring readings");
    let temps = source.acquire()?;
    if temps.is_empty() {
        error!("Source returned no readings");
        return Err(Error::EmptyReadings);
    }
    info!("Acquired {} readings: {:?}", temps.len(), temps);

    let labels = resolve_labels(labels_text, temps.len())?;
    let message = build_message(&temps, &labels)?;

    println!("Sending message: {}", message);
    transport.send(&message)?;
    println!("Message successfully sent");
    info!("Message successfully sent");

    Ok(message)
}
