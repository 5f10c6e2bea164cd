//! Sync creation and status polling
//!
//! A sync moves `DEFINED -> SYNCING -> {SUCCESS, FAILED, TIMED_OUT}`.
//! Failed syncs that left diagnostic logs are retried with a brand-new sync
//! of the same export definition; everything else is fatal.

use anyhow::{Context, Result};
use log::{error, info, warn};

use super::ExportError;
use crate::api::BulkApi;
use crate::api::types::{SyncResponse, SyncStatus};
use crate::config::ExportSettings;
use crate::sync::Clock;

/// A sync that reached `success`, the only state pagination may start from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub sync_uri: String,
    /// Syncs re-created after a failure before this one succeeded
    pub retries: u32,
    /// Status checks made on the successful sync
    pub polls: u32,
}

/// Terminal result of polling one sync
enum PollResult {
    Succeeded { polls: u32 },
    Failed(SyncStatus),
}

/// Drives syncs of one export definition to success
pub struct SyncPoller<'a> {
    api: &'a dyn BulkApi,
    clock: &'a dyn Clock,
    settings: &'a ExportSettings,
}

impl<'a> SyncPoller<'a> {
    pub fn new(api: &'a dyn BulkApi, clock: &'a dyn Clock, settings: &'a ExportSettings) -> Self {
        Self {
            api,
            clock,
            settings,
        }
    }

    /// Sync `export_uri` until a sync succeeds.
    ///
    /// # Errors
    /// - `ExportError::PollTimeout` if a sync stays running past the attempt budget
    /// - `ExportError::SyncFailedWithoutLogs` if a failed sync left no error logs
    /// - `ExportError::MaxRetriesExceeded` once the retry budget is spent
    pub fn run(&self, export_uri: &str) -> Result<SyncOutcome> {
        let mut retries = 0;

        loop {
            let sync = self
                .api
                .create_sync(export_uri)
                .with_context(|| format!("Failed to create sync for export {}", export_uri))?;
            info!("Created sync {} for export {}", sync.uri, export_uri);

            let status = match self.poll(&sync)? {
                PollResult::Succeeded { polls } => {
                    info!("Sync {} completed successfully", sync.uri);
                    return Ok(SyncOutcome {
                        sync_uri: sync.uri,
                        retries,
                        polls,
                    });
                }
                PollResult::Failed(status) => status,
            };

            warn!("Sync {} finished with status {:?}", sync.uri, status);
            let errors = self.error_logs(&sync.uri)?;

            if errors.is_empty() {
                error!("Sync {} failed and Eloqua returned no error logs", sync.uri);
                return Err(ExportError::SyncFailedWithoutLogs { sync_uri: sync.uri }.into());
            }

            if retries >= self.settings.max_sync_retries {
                error!(
                    "Export {} failed after {} retries: {}",
                    export_uri,
                    retries,
                    errors.join("; ")
                );
                return Err(ExportError::MaxRetriesExceeded {
                    export_uri: export_uri.to_string(),
                    retries,
                    logs: errors,
                }
                .into());
            }

            retries += 1;
            warn!(
                "Retrying export {} with a new sync ({} of {}): {}",
                export_uri,
                retries,
                self.settings.max_sync_retries,
                errors.join("; ")
            );
        }
    }

    /// Check status until terminal; a delay separates consecutive checks
    fn poll(&self, sync: &SyncResponse) -> Result<PollResult> {
        let max_attempts = self.settings.max_poll_attempts;
        let mut attempts = 0;

        loop {
            let current = self
                .api
                .get_sync(&sync.uri)
                .with_context(|| format!("Failed to check status of sync {}", sync.uri))?;
            attempts += 1;

            match current.status {
                SyncStatus::Success => return Ok(PollResult::Succeeded { polls: attempts }),
                status if status.is_running() => {
                    if attempts >= max_attempts {
                        error!("Sync {} still running after {} checks", sync.uri, attempts);
                        return Err(ExportError::PollTimeout {
                            sync_uri: sync.uri.clone(),
                            attempts,
                        }
                        .into());
                    }
                    info!(
                        "Sync {} not completed yet - check {} of {}",
                        sync.uri, attempts, max_attempts
                    );
                    self.clock.sleep(self.settings.poll_interval());
                }
                // `warning` fails an export just like `error`
                status => return Ok(PollResult::Failed(status)),
            }
        }
    }

    /// Non-informational log messages of a failed sync
    fn error_logs(&self, sync_uri: &str) -> Result<Vec<String>> {
        let entries = self
            .api
            .list_sync_logs(sync_uri)
            .with_context(|| format!("Failed to fetch logs of sync {}", sync_uri))?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_informational())
            .map(|entry| entry.message)
            .collect())
    }
}
