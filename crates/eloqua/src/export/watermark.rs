//! Highest replication-key value seen for a stream

use chrono::NaiveDateTime;
use log::debug;
use serde_json::Value;

use crate::models::{Record, parse_timestamp};

/// Tracks the maximum replication-key timestamp across all fetched batches.
///
/// Values are compared as parsed timestamps, never as raw strings, and the
/// tracked value only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkTracker {
    key: String,
    current: Option<NaiveDateTime>,
}

impl WatermarkTracker {
    /// Start tracking `key`, optionally from a previous watermark
    pub fn new(key: impl Into<String>, initial: Option<NaiveDateTime>) -> Self {
        Self {
            key: key.into(),
            current: initial,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn current(&self) -> Option<NaiveDateTime> {
        self.current
    }

    /// Fold a batch in; returns the batch's own maximum
    pub fn observe(&mut self, records: &[Record]) -> Option<NaiveDateTime> {
        let batch_max = records.iter().filter_map(|r| self.value_of(r)).max();
        if let Some(max) = batch_max {
            self.advance_to(max);
        }
        batch_max
    }

    /// Move forward to `ts` if it is newer
    pub fn advance_to(&mut self, ts: NaiveDateTime) {
        if self.current.is_none_or(|current| ts > current) {
            self.current = Some(ts);
        }
    }

    /// Max-reduce another tracker's value into this one
    pub fn merge(&mut self, other: &WatermarkTracker) {
        if let Some(ts) = other.current {
            self.advance_to(ts);
        }
    }

    fn value_of(&self, record: &Record) -> Option<NaiveDateTime> {
        match record.get(&self.key) {
            Some(Value::String(s)) => {
                let parsed = parse_timestamp(s);
                if parsed.is_none() {
                    debug!("Ignoring unparsable {} value '{}'", self.key, s);
                }
                parsed
            }
            _ => None,
        }
    }
}
