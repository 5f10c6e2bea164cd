//! Bookmark storage
//!
//! Bookmarks record how far each stream has been extracted. The trait lets
//! the sync run against an in-memory store seeded from a state document, or
//! against a local SQLite database.

mod memory;
mod sqlite;
mod state;
mod traits;

pub use memory::InMemoryBookmarkStore;
pub use sqlite::SqliteBookmarkStore;
pub use state::{bookmarks_from_state, state_document};
pub use traits::BookmarkStore;
