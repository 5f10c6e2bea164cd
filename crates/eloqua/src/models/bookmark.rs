//! Per-stream extraction progress

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_timestamp, parse_timestamp};

/// Resume point for one stream
///
/// `last_updated` is the highest replication-key value emitted so far, in the
/// vendor timestamp form. The next run starts its first window there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Stream name (e.g. "contacts")
    pub stream: String,
    /// Watermark in vendor timestamp form
    pub last_updated: String,
    /// When this bookmark was last written
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(stream: impl Into<String>, watermark: &NaiveDateTime) -> Self {
        Self {
            stream: stream.into(),
            last_updated: format_timestamp(watermark),
            updated_at: Utc::now(),
        }
    }

    /// Parsed watermark, `None` if the stored string is unreadable
    pub fn watermark(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.last_updated)
    }

    /// Advance to a new watermark
    pub fn updated(mut self, watermark: &NaiveDateTime) -> Self {
        self.last_updated = format_timestamp(watermark);
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bookmark() {
        let ts = parse_timestamp("2024-05-01 12:30:00").unwrap();
        let bookmark = Bookmark::new("contacts", &ts);
        assert_eq!(bookmark.stream, "contacts");
        assert_eq!(bookmark.last_updated, "2024-05-01 12:30:00.000");
        assert_eq!(bookmark.watermark(), Some(ts));
    }

    #[test]
    fn test_updated_bookmark() {
        let ts = parse_timestamp("2024-05-01").unwrap();
        let later = parse_timestamp("2024-06-01").unwrap();
        let bookmark = Bookmark::new("opens", &ts).updated(&later);
        assert_eq!(bookmark.stream, "opens");
        assert_eq!(bookmark.watermark(), Some(later));
    }

    #[test]
    fn test_deserialize_without_updated_at() {
        let json = r#"{"stream": "sends", "last_updated": "2023-12-31 23:59:59.999"}"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bookmark.stream, "sends");
        assert!(bookmark.watermark().is_some());
    }
}
