//! Output of extracted records
//!
//! The engine produces batches; a sink decides what becomes of them. The
//! standard sink writes Singer messages (SCHEMA, RECORD, STATE) as JSON lines.

mod singer;

pub use singer::{MemorySink, SingerMessage, SingerSink, coerce_record};

use anyhow::Result;
use serde_json::Value;

use crate::discovery::CatalogEntry;
use crate::models::Record;

/// Destination for schemas, records and checkpoints
pub trait RecordSink: Send + Sync {
    /// Announce a stream's schema before its first record
    fn write_schema(&self, entry: &CatalogEntry) -> Result<()>;

    /// Write one batch of records for a stream
    fn write_records(&self, stream: &str, records: &[Record]) -> Result<()>;

    /// Write a checkpoint (a full state document)
    fn write_state(&self, state: &Value) -> Result<()>;
}
