//! Half-open time windows used as the unit of export work

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use std::fmt;

/// Timestamp form the Bulk API expects in filters: `2019-08-06 04:29:15.440`
pub const VENDOR_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Split alignment units, coarsest first, in milliseconds
const ALIGNMENT_UNITS_MS: [i64; 5] = [86_400_000, 3_600_000, 60_000, 1_000, 1];

/// Render a timestamp in the vendor's millisecond-resolution local form
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(VENDOR_TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp as the vendor (or a saved bookmark) writes it.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated variant, RFC 3339
/// (offset dropped, wall-clock kept) and bare dates.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A half-open interval `[start, end)`; `end == None` means open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// Create a bounded window. `end` must be after `start`.
    pub fn bounded(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(end > start, "window end must be after start");
        Self {
            start,
            end: Some(end),
        }
    }

    /// Create a window with no upper bound
    pub fn unbounded(start: NaiveDateTime) -> Self {
        Self { start, end: None }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    /// Length of the window, `None` when open-ended
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end.map(|end| end - self.start)
    }

    /// Point at which [`split`](Self::split) would cut this window.
    ///
    /// The temporal midpoint, floored to the coarsest unit (day, hour, minute,
    /// second, millisecond) the window spans at least twice. Flooring keeps the
    /// sub-window boundaries readable in export names and logs while still
    /// leaving both halves non-empty.
    pub fn split_point(&self) -> Option<NaiveDateTime> {
        let span_ms = self.duration()?.num_milliseconds();
        let unit = ALIGNMENT_UNITS_MS
            .iter()
            .copied()
            .find(|unit| span_ms >= unit * 2)?;

        let midpoint = self.start + TimeDelta::milliseconds(span_ms / 2);
        let millis = midpoint.and_utc().timestamp_millis();
        let floored = millis - millis.rem_euclid(unit);
        let point = DateTime::from_timestamp_millis(floored)?.naive_utc();

        (point > self.start && Some(point) < self.end).then_some(point)
    }

    /// Bisect into two new windows `[start, mid)` and `[mid, end)`.
    ///
    /// Returns `None` for open-ended windows and windows shorter than 2ms.
    pub fn split(&self) -> Option<(TimeWindow, TimeWindow)> {
        let mid = self.split_point()?;
        let end = self.end?;
        Some((
            TimeWindow::bounded(self.start, mid),
            TimeWindow::bounded(mid, end),
        ))
    }

    /// Whether `ts` falls inside the window
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        *ts >= self.start && self.end.is_none_or(|end| *ts < end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(
                f,
                "[{}, {})",
                format_timestamp(&self.start),
                format_timestamp(end)
            ),
            None => write!(f, "[{}, ..)", format_timestamp(&self.start)),
        }
    }
}
