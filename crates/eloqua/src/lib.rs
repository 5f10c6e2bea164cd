//! Eloqua crate - bulk-export extraction for Oracle Eloqua
//!
//! This crate provides:
//! - Domain models (streams, time windows, bookmarks, records)
//! - Bulk API 2.0 client behind the `BulkApi` trait
//! - The export engine: definition building, sync polling, window
//!   bisection, pagination and watermark tracking
//! - Field-schema discovery and the Singer catalog
//! - Bookmark storage (in-memory and SQLite)
//! - Singer output and the per-stream sync loop

pub mod api;
pub mod config;
pub mod discovery;
pub mod emit;
pub mod export;
pub mod models;
pub mod storage;
pub mod sync;

pub use api::{ApiStatusError, BasicAuth, BulkApi, EloquaClient};
pub use config::{ExportSettings, TapConfig};
pub use discovery::{Catalog, CatalogEntry, SchemaResolver, discover};
pub use emit::{MemorySink, RecordSink, SingerMessage, SingerSink};
pub use export::{
    BatchHandler, ExportDefinition, ExportEngine, ExportError, ExtractStats, Paginator,
    RequestQueue, SyncOutcome, SyncPoller, WatermarkTracker, WindowDecision,
    build_export_definition,
};
pub use models::{
    Bookmark, BulkEntity, Record, RecordBatch, StreamDescriptor, StreamKind, TimeWindow,
    format_timestamp, parse_timestamp,
};
pub use storage::{BookmarkStore, InMemoryBookmarkStore, SqliteBookmarkStore};
pub use sync::{
    Clock, ManualClock, StreamStats, SyncContext, SyncOptions, SystemClock, sync_stream,
    sync_streams,
};
