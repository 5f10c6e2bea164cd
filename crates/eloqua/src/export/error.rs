//! Named failure conditions of the export engine

/// Fatal and structural export failures.
///
/// Raised through `anyhow` and recovered with `downcast_ref` where callers
/// need to tell them apart. None of these are retried: they abort the run and
/// leave the last checkpointed watermark as the resume point.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Stream '{stream}' has no field for replication key '{key}'")]
    MissingReplicationKey { stream: String, key: String },

    #[error("Stream '{stream}' resolved to an empty field set")]
    EmptyFieldSet { stream: String },

    #[error(
        "Export {export_uri} failed after {retries} sync retries. Errors during export sync: {}. \
         Vendor error messages are often vague; check the export definition fields and filter",
        logs.join("; ")
    )]
    MaxRetriesExceeded {
        export_uri: String,
        retries: u32,
        logs: Vec<String>,
    },

    #[error("Sync {sync_uri} still running after {attempts} status checks")]
    PollTimeout { sync_uri: String, attempts: u32 },

    #[error("Sync {sync_uri} failed with no error logs from Eloqua")]
    SyncFailedWithoutLogs { sync_uri: String },

    #[error(
        "Window {window} holds {total_results} records (limit {limit}) and cannot be split further"
    )]
    WindowTooDense {
        window: String,
        total_results: u64,
        limit: u64,
    },

    #[error("Sync {sync_uri} reported {expected} records but {fetched} were fetched")]
    IncompleteDrain {
        sync_uri: String,
        expected: u64,
        fetched: u64,
    },
}
