//! Bulk API trait definition

use anyhow::Result;

use super::types::{ExportResponse, FieldDefinition, ListResponse, ResultPage, SyncLogEntry, SyncResponse};
use crate::export::ExportDefinition;
use crate::models::BulkEntity;

/// Operations the export engine needs from the Bulk API
///
/// This trait abstracts over the HTTP client so the engine can be driven
/// against a simulated vendor in tests. Implementations must be safe to share
/// between parallel stream workers.
pub trait BulkApi: Send + Sync {
    /// List one page of field definitions for an entity
    fn list_fields(
        &self,
        entity: BulkEntity,
        offset: usize,
        limit: usize,
    ) -> Result<ListResponse<FieldDefinition>>;

    /// Create an export definition
    fn create_export(
        &self,
        entity: BulkEntity,
        definition: &ExportDefinition,
    ) -> Result<ExportResponse>;

    /// Start a sync of an export definition
    fn create_sync(&self, export_uri: &str) -> Result<SyncResponse>;

    /// Look up the current status of a sync
    fn get_sync(&self, sync_uri: &str) -> Result<SyncResponse>;

    /// Fetch all log entries of a sync
    fn list_sync_logs(&self, sync_uri: &str) -> Result<Vec<SyncLogEntry>>;

    /// Fetch one page of a successful sync's dataset
    fn fetch_data(&self, sync_uri: &str, offset: usize, limit: usize) -> Result<ResultPage>;
}
