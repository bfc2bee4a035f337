use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::Formatter;
use std::borrow::Cow;
use std::io;

/// Label to reading mapping, serialized in reading order.
struct Measurements<'a> {
    readings: &'a [f64],
    labels: &'a [String],
}

impl Measurements<'_> {
    fn key(&self, index: usize) -> Cow<'_, str> {
        match self.labels.get(index) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Owned(format!("temp{}", index)),
        }
    }
}

impl Serialize for Measurements<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for (index, reading) in self.readings.iter().enumerate() {
            map.serialize_entry(&self.key(index), reading)?;
        }
        map.end()
    }
}

/// `{"a": 1.0, "b": 2.0}` spacing.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Builds the JSON message for one set of readings.
///
/// With no labels each reading is keyed `temp<index>`; otherwise
/// `labels[i]` names `readings[i]`. Values are written as received.
pub fn build_message(readings: &[f64], labels: &[String]) -> Result<String> {
    if readings.is_empty() {
        return Err(Error::EmptyReadings);
    }
    if !labels.is_empty() && labels.len() != readings.len() {
        return Err(Error::LabelCountMismatch {
            labels: labels.len(),
            readings: readings.len(),
        });
    }

    let measurements = Measurements { readings, labels };
    let mut out = Vec::with_capacity(16 * readings.len());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    measurements
        .serialize(&mut serializer)
        .map_err(|e| Error::Io(io::Error::other(e)))?;

    // serde_json only writes valid UTF-8
    String::from_utf8(out).map_err(|e| Error::Io(io::Error::other(e)))
}
