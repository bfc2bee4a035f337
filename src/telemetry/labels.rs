use crate::config::ENV_LABELS;
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::{error, info};

/// Turns the raw `IOT_LABELS` text into one label per reading.
///
/// No text means no labels and the message falls back to `temp0`,
/// `temp1`, ... names. Text that is present must name every reading.
pub fn resolve_labels(raw: Option<&str>, reading_count: usize) -> Result<Vec<String>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => {
            info!("No labels configured, using generated names");
            return Ok(Vec::new());
        }
        Some(raw) => raw,
    };

    let labels: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| Error::invalid(ENV_LABELS, format!("expected a JSON array of strings: {}", e)))?;

    if labels.len() != reading_count {
        error!(
            "Count of labels ({}) doesn't match count of measured values ({})",
            labels.len(),
            reading_count
        );
        return Err(Error::LabelCountMismatch {
            labels: labels.len(),
            readings: reading_count,
        });
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(Error::invalid(
            ENV_LABELS,
            format!("label '{}' is used more than once", duplicate),
        ));
    }

    info!("Using labels {:?}", labels);
    Ok(labels)
}
