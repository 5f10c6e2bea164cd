//! Storage trait definitions

use crate::models::Bookmark;
use anyhow::Result;

/// Trait for bookmark persistence
///
/// Backends hold at most one bookmark per stream. Saving replaces the
/// previous bookmark for that stream.
pub trait BookmarkStore: Send + Sync {
    /// Get the bookmark for a stream
    fn get_bookmark(&self, stream: &str) -> Result<Option<Bookmark>>;

    /// Save a bookmark (upsert)
    fn save_bookmark(&self, bookmark: Bookmark) -> Result<()>;

    /// All bookmarks, ordered by stream name
    fn list_bookmarks(&self) -> Result<Vec<Bookmark>>;
}
