//! In-memory bookmark storage
//!
//! Used when state is passed in as a JSON document and emitted back out as
//! STATE messages rather than persisted locally.

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use super::BookmarkStore;
use super::state::{bookmarks_from_state, state_document};
use crate::models::Bookmark;

/// In-memory implementation of BookmarkStore
pub struct InMemoryBookmarkStore {
    bookmarks: RwLock<HashMap<String, Bookmark>>,
}

impl InMemoryBookmarkStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            bookmarks: RwLock::new(HashMap::new()),
        }
    }

    /// Seed from a state document
    pub fn from_state(state: &Value) -> Result<Self> {
        let store = Self::new();
        {
            let mut bookmarks = store.bookmarks.write().unwrap();
            for bookmark in bookmarks_from_state(state)? {
                bookmarks.insert(bookmark.stream.clone(), bookmark);
            }
        }
        Ok(store)
    }

    /// Current contents as a state document
    pub fn to_state(&self) -> Value {
        let mut bookmarks: Vec<Bookmark> = self.bookmarks.read().unwrap().values().cloned().collect();
        bookmarks.sort_by(|a, b| a.stream.cmp(&b.stream));
        state_document(&bookmarks)
    }
}

impl Default for InMemoryBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkStore for InMemoryBookmarkStore {
    fn get_bookmark(&self, stream: &str) -> Result<Option<Bookmark>> {
        let bookmarks = self.bookmarks.read().unwrap();
        Ok(bookmarks.get(stream).cloned())
    }

    fn save_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        let mut bookmarks = self.bookmarks.write().unwrap();
        bookmarks.insert(bookmark.stream.clone(), bookmark);
        Ok(())
    }

    fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let mut bookmarks: Vec<Bookmark> = self.bookmarks.read().unwrap().values().cloned().collect();
        bookmarks.sort_by(|a, b| a.stream.cmp(&b.stream));
        Ok(bookmarks)
    }
}
