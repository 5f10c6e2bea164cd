//! Per-sub-stream export loop

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{error, info};

use super::{
    ExportError, Paginator, RequestQueue, SyncPoller, WindowDecision, build_export_definition,
};
use crate::api::BulkApi;
use crate::config::ExportSettings;
use crate::models::{RecordBatch, StreamDescriptor, TimeWindow};
use crate::sync::Clock;

/// Receives the output of [`ExportEngine::extract`]
pub trait BatchHandler {
    /// One page of records from a drained window
    fn on_batch(&mut self, window: &TimeWindow, batch: RecordBatch) -> Result<()>;

    /// Every record of `window` has been handed over (or it had none).
    ///
    /// Windows complete in chronological order, so this is a safe point to
    /// checkpoint the watermark.
    fn on_window_complete(&mut self, _window: &TimeWindow) -> Result<()> {
        Ok(())
    }
}

/// Statistics from extracting one sub-stream
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractStats {
    /// Export definitions created (one per window attempted)
    pub exports_created: usize,
    /// Windows bisected because they reached the export limit
    pub windows_split: usize,
    /// Windows whose sync held no records
    pub windows_empty: usize,
    /// Windows fully paginated
    pub windows_drained: usize,
    /// Syncs re-created after failures
    pub sync_retries: u32,
    /// Records handed to the batch handler
    pub records: usize,
}

/// Runs the window worklist for a sub-stream against the Bulk API
pub struct ExportEngine<'a> {
    api: &'a dyn BulkApi,
    clock: &'a dyn Clock,
    settings: &'a ExportSettings,
}

impl<'a> ExportEngine<'a> {
    pub fn new(api: &'a dyn BulkApi, clock: &'a dyn Clock, settings: &'a ExportSettings) -> Self {
        Self {
            api,
            clock,
            settings,
        }
    }

    /// Export everything in `[start, now)` for one sub-stream.
    ///
    /// Each window gets its own export definition and a successful sync, then
    /// is split, skipped or drained depending on its result-set size. Returns
    /// once the worklist is empty; any fatal error aborts immediately.
    pub fn extract(
        &self,
        descriptor: &StreamDescriptor,
        start: NaiveDateTime,
        handler: &mut dyn BatchHandler,
    ) -> Result<ExtractStats> {
        let mut stats = ExtractStats::default();
        let now = self.clock.now();

        if start >= now {
            info!("{}: nothing to extract, start {} is not before now", descriptor.name(), start);
            return Ok(stats);
        }

        let mut queue = RequestQueue::new(
            TimeWindow::bounded(start, now),
            self.settings.export_limit,
            self.settings.min_window(),
        );
        let poller = SyncPoller::new(self.api, self.clock, self.settings);

        while let Some(window) = queue.pop() {
            info!("{}: requesting export for {}", descriptor.name(), window);

            let definition = build_export_definition(descriptor, &window, descriptor.event_type());
            let export = self
                .api
                .create_export(descriptor.entity(), &definition)
                .with_context(|| {
                    format!("Failed to create {} export for {}", descriptor.name(), window)
                })?;
            stats.exports_created += 1;

            let sync = poller.run(&export.uri)?;
            stats.sync_retries += sync.retries;

            let pages = Paginator::open(self.api, &sync, self.settings.page_size)?;
            let total = pages.total_results();

            match queue.settle(&window, total)? {
                WindowDecision::Split => {
                    info!(
                        "{}: export of {} has {} records (limit {}), splitting into two requests",
                        descriptor.name(),
                        window,
                        total,
                        self.settings.export_limit
                    );
                }
                WindowDecision::Empty => {
                    stats.windows_empty += 1;
                    info!("{}: no records found in {}", descriptor.name(), window);
                    handler.on_window_complete(&window)?;
                }
                WindowDecision::Drain => {
                    let mut fetched = 0;
                    for batch in pages {
                        let batch = batch?;
                        fetched += batch.len();
                        info!(
                            "{}: fetched {} of {} records",
                            descriptor.name(),
                            fetched,
                            total
                        );
                        handler.on_batch(&window, batch)?;
                    }

                    // Records are unordered across pages, so a partial drain
                    // must not reach the checkpoint
                    if fetched as u64 != total {
                        error!(
                            "{}: sync {} reported {} records but {} were fetched",
                            descriptor.name(),
                            sync.sync_uri,
                            total,
                            fetched
                        );
                        return Err(ExportError::IncompleteDrain {
                            sync_uri: sync.sync_uri,
                            expected: total,
                            fetched: fetched as u64,
                        }
                        .into());
                    }

                    stats.records += fetched;
                    stats.windows_drained += 1;
                    handler.on_window_complete(&window)?;
                }
            }
        }

        stats.windows_split = queue.splits();
        info!(
            "{}: completed with {} records from {} exports ({} splits)",
            descriptor.name(),
            stats.records,
            stats.exports_created,
            stats.windows_split
        );
        Ok(stats)
    }
}
