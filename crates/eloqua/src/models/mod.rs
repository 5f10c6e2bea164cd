//! Domain models for bulk-export extraction

mod bookmark;
mod record;
mod stream;
mod window;

pub use bookmark::Bookmark;
pub use record::{Record, RecordBatch};
pub use stream::{BulkEntity, StreamDescriptor, StreamKind, UnknownStreamError};
pub use window::{TimeWindow, VENDOR_TIMESTAMP_FORMAT, format_timestamp, parse_timestamp};
