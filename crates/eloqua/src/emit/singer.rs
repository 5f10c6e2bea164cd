//! Singer JSON-lines sink

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::sync::Mutex;

use super::RecordSink;
use crate::discovery::CatalogEntry;
use crate::models::Record;

/// One line of Singer output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum SingerMessage {
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Record,
        time_extracted: String,
    },
    State {
        value: Value,
    },
}

/// Coerce a raw record to the catalog's `["null", "string"]` typing.
///
/// Strings and nulls pass through; other scalars are rendered as strings and
/// nested values as compact JSON.
pub fn coerce_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            let coerced = match value {
                Value::Null | Value::String(_) => value.clone(),
                Value::Bool(b) => Value::String(b.to_string()),
                Value::Number(n) => Value::String(n.to_string()),
                Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
            };
            (key.clone(), coerced)
        })
        .collect()
}

fn schema_message(entry: &CatalogEntry) -> SingerMessage {
    SingerMessage::Schema {
        stream: entry.stream.clone(),
        schema: entry.schema.clone(),
        key_properties: entry.key_properties.clone(),
        bookmark_properties: vec![entry.replication_key.clone()],
    }
}

fn record_messages(stream: &str, records: &[Record]) -> Vec<SingerMessage> {
    let time_extracted = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    records
        .iter()
        .map(|record| SingerMessage::Record {
            stream: stream.to_string(),
            record: coerce_record(record),
            time_extracted: time_extracted.clone(),
        })
        .collect()
}

/// Writes Singer messages as JSON lines.
///
/// A batch is written under a single lock, so lines from concurrent streams
/// never interleave within a batch.
pub struct SingerSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> SingerSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap()
    }

    fn write_messages(&self, messages: &[SingerMessage]) -> Result<()> {
        let mut out = self.out.lock().unwrap();
        for message in messages {
            serde_json::to_writer(&mut *out, message).context("Failed to serialize message")?;
            out.write_all(b"\n").context("Failed to write message")?;
        }
        out.flush().context("Failed to flush output")?;
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for SingerSink<W> {
    fn write_schema(&self, entry: &CatalogEntry) -> Result<()> {
        self.write_messages(&[schema_message(entry)])
    }

    fn write_records(&self, stream: &str, records: &[Record]) -> Result<()> {
        self.write_messages(&record_messages(stream, records))
    }

    fn write_state(&self, state: &Value) -> Result<()> {
        self.write_messages(&[SingerMessage::State {
            value: state.clone(),
        }])
    }
}

/// Collects messages in memory
#[derive(Default)]
pub struct MemorySink {
    messages: Mutex<Vec<SingerMessage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SingerMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Records written for one stream, in write order
    pub fn records(&self, stream: &str) -> Vec<Record> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                SingerMessage::Record {
                    stream: s, record, ..
                } if s == stream => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// State documents written, in write order
    pub fn states(&self) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                SingerMessage::State { value } => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn write_schema(&self, entry: &CatalogEntry) -> Result<()> {
        self.messages.lock().unwrap().push(schema_message(entry));
        Ok(())
    }

    fn write_records(&self, stream: &str, records: &[Record]) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .extend(record_messages(stream, records));
        Ok(())
    }

    fn write_state(&self, state: &Value) -> Result<()> {
        self.messages.lock().unwrap().push(SingerMessage::State {
            value: state.clone(),
        });
        Ok(())
    }
}
