//! Bulk-export synchronization and pagination engine
//!
//! Turns a (stream, time window, event type) request into a fully drained set
//! of records:
//! - `definition` builds the export request body and filter
//! - `poller` drives a sync to success, retrying failed syncs
//! - `paginator` drains a successful sync page by page
//! - `splitter` holds the window worklist and bisects oversized windows
//! - `watermark` tracks the highest replication-key value seen
//! - `engine` ties them together per sub-stream

mod definition;
mod engine;
mod error;
mod paginator;
mod poller;
mod splitter;
mod watermark;

pub use definition::{ACTIVITY_TYPE_STATEMENT, ExportDefinition, build_export_definition};
pub use engine::{BatchHandler, ExportEngine, ExtractStats};
pub use error::ExportError;
pub use paginator::Paginator;
pub use poller::{SyncOutcome, SyncPoller};
pub use splitter::{RequestQueue, WindowDecision};
pub use watermark::WatermarkTracker;
