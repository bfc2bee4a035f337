use super::arduino::parse_temps;
use super::ReadingSource;
use crate::error::Result;
use tracing::info;

/// What the temps board answers with three probes attached.
const SAMPLE_RESPONSE: &str = r#"{"temps":[18.63,22.56,16.56]}"#;

/// Stand-in for the board when no hardware is attached.
#[derive(Debug, Default)]
pub struct FixedSource;

impl ReadingSource for FixedSource {
    fn acquire(&mut self) -> Result<Vec<f64>> {
        let temps = parse_temps(SAMPLE_RESPONSE)?;
        info!("Using fixed readings: {:?}", temps);
        Ok(temps)
    }
}
