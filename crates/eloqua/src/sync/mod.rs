//! Sync engine for extracting streams
//!
//! Runs each selected stream from its bookmark to now, checkpointing as
//! windows complete, so an interrupted run can be resumed.

mod stream;
mod timing;

pub use stream::{StreamStats, SyncContext, SyncOptions, sync_stream, sync_streams};
pub use timing::{Clock, ManualClock, SystemClock};
