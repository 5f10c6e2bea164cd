//! Window worklist with bisection of oversized exports

use anyhow::Result;
use chrono::TimeDelta;
use std::collections::VecDeque;

use super::ExportError;
use crate::models::TimeWindow;

/// What to do with a window once its sync succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// At or over the export limit; both halves were queued, emit nothing
    Split,
    /// No records in the window
    Empty,
    /// Fetch every page
    Drain,
}

/// Worklist of windows still to export for one sub-stream.
///
/// Split halves go back on the front, left half first, so windows are always
/// handed out in chronological order. Once a window is drained, nothing
/// earlier than its end is still pending, which is what makes per-window
/// watermark checkpoints safe.
#[derive(Debug)]
pub struct RequestQueue {
    windows: VecDeque<TimeWindow>,
    export_limit: u64,
    min_window: TimeDelta,
    splits: usize,
}

impl RequestQueue {
    pub fn new(seed: TimeWindow, export_limit: u64, min_window: TimeDelta) -> Self {
        Self {
            windows: VecDeque::from([seed]),
            export_limit,
            min_window,
            splits: 0,
        }
    }

    /// Next window to export
    pub fn pop(&mut self) -> Option<TimeWindow> {
        self.windows.pop_front()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows bisected so far
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Decide a window's fate from its result-set size, queueing halves on split.
    ///
    /// # Errors
    /// `ExportError::WindowTooDense` when an over-limit window is already at
    /// the minimum duration (or cannot be bisected at all).
    pub fn settle(&mut self, window: &TimeWindow, total_results: u64) -> Result<WindowDecision> {
        if total_results == 0 {
            return Ok(WindowDecision::Empty);
        }
        if total_results < self.export_limit {
            return Ok(WindowDecision::Drain);
        }

        let too_dense = || ExportError::WindowTooDense {
            window: window.to_string(),
            total_results,
            limit: self.export_limit,
        };

        if window.duration().is_none_or(|d| d <= self.min_window) {
            return Err(too_dense().into());
        }
        let (left, right) = window.split().ok_or_else(too_dense)?;

        self.windows.push_front(right);
        self.windows.push_front(left);
        self.splits += 1;
        Ok(WindowDecision::Split)
    }
}
