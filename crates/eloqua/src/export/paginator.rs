//! Offset-based draining of a successful sync

use anyhow::{Context, Result};
use log::{debug, error};

use super::{ExportError, SyncOutcome};
use crate::api::BulkApi;
use crate::api::types::ResultPage;
use crate::models::RecordBatch;

/// Lazy, finite, non-restartable sequence of record batches from one sync.
///
/// Opening the paginator fetches the first page so `total_results` is known
/// before the caller decides whether to drain. That page is then yielded
/// first; it is never fetched twice. The offset advances by the number of
/// records actually returned, so a page shorter than `page_size` is never
/// skipped past.
pub struct Paginator<'a> {
    api: &'a dyn BulkApi,
    sync_uri: String,
    page_size: usize,
    offset: usize,
    total_results: u64,
    first_page: Option<ResultPage>,
    done: bool,
}

impl<'a> Paginator<'a> {
    /// Open the result set of a successful sync and fetch its first page
    pub fn open(api: &'a dyn BulkApi, sync: &SyncOutcome, page_size: usize) -> Result<Self> {
        let first_page = api
            .fetch_data(&sync.sync_uri, 0, page_size)
            .with_context(|| format!("Failed to fetch first page of sync {}", sync.sync_uri))?;

        Ok(Self {
            api,
            sync_uri: sync.sync_uri.clone(),
            page_size,
            offset: 0,
            total_results: first_page.total_results,
            first_page: Some(first_page),
            done: false,
        })
    }

    /// Size of the whole result set, as reported on the first page
    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    fn next_page(&mut self) -> Result<ResultPage> {
        if let Some(page) = self.first_page.take() {
            return Ok(page);
        }
        debug!("Fetching {} at offset {}", self.sync_uri, self.offset);
        self.api
            .fetch_data(&self.sync_uri, self.offset, self.page_size)
            .with_context(|| {
                format!(
                    "Failed to fetch records of sync {} at offset {}",
                    self.sync_uri, self.offset
                )
            })
    }
}

impl Iterator for Paginator<'_> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let page = match self.next_page() {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if page.items.is_empty() && page.has_more {
            // An empty page that claims more would loop forever
            error!(
                "Sync {} returned an empty page at offset {} with hasMore set",
                self.sync_uri, self.offset
            );
            self.done = true;
            return Some(Err(ExportError::IncompleteDrain {
                sync_uri: self.sync_uri.clone(),
                expected: self.total_results,
                fetched: self.offset as u64,
            }
            .into()));
        }

        let batch = RecordBatch::new(self.offset, page.items);
        self.offset += batch.len();
        self.done = !page.has_more;

        Some(Ok(batch))
    }
}
