//! Singer state document conversion
//!
//! The state document has the shape
//! `{"bookmarks": {"<stream>": {"last_updated": "<timestamp>"}}}`.

use anyhow::{Result, bail};
use serde_json::{Map, Value, json};

use crate::models::Bookmark;

/// Render bookmarks as a state document
pub fn state_document(bookmarks: &[Bookmark]) -> Value {
    let streams: Map<String, Value> = bookmarks
        .iter()
        .map(|b| (b.stream.clone(), json!({"last_updated": b.last_updated})))
        .collect();
    json!({ "bookmarks": streams })
}

/// Read bookmarks out of a state document.
///
/// Streams without a string `last_updated` are skipped. A document with no
/// `bookmarks` object yields nothing.
pub fn bookmarks_from_state(state: &Value) -> Result<Vec<Bookmark>> {
    let Some(root) = state.as_object() else {
        bail!("State must be a JSON object");
    };

    let Some(streams) = root.get("bookmarks") else {
        return Ok(Vec::new());
    };
    let Some(streams) = streams.as_object() else {
        bail!("State 'bookmarks' must be a JSON object");
    };

    let mut bookmarks: Vec<Bookmark> = streams
        .iter()
        .filter_map(|(stream, entry)| {
            let last_updated = entry.get("last_updated")?.as_str()?;
            Some(Bookmark {
                stream: stream.clone(),
                last_updated: last_updated.to_string(),
                updated_at: chrono::Utc::now(),
            })
        })
        .collect();
    bookmarks.sort_by(|a, b| a.stream.cmp(&b.stream));
    Ok(bookmarks)
}
