//! SQLite-based bookmark storage

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rusqlite_migration::{M, Migrations};

use super::traits::BookmarkStore;
use crate::models::Bookmark;

/// Database migrations
///
/// Applied in order; the user_version pragma tracks progress.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            CREATE TABLE bookmarks (
                stream TEXT PRIMARY KEY NOT NULL,
                last_updated TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        ),
    ])
}

/// Bookmarks persisted in a local SQLite database
pub struct SqliteBookmarkStore {
    conn: Mutex<Connection>,
}

impl SqliteBookmarkStore {
    /// Open (or create) the database at `db_path` and migrate it
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;

        // WAL keeps a reader from blocking a checkpoint write
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn row_to_bookmark(stream: String, last_updated: String, updated_at: String) -> Bookmark {
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    Bookmark {
        stream,
        last_updated,
        updated_at,
    }
}

impl BookmarkStore for SqliteBookmarkStore {
    fn get_bookmark(&self, stream: &str) -> Result<Option<Bookmark>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT stream, last_updated, updated_at FROM bookmarks WHERE stream = ?",
                [stream],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.map(|(stream, last_updated, updated_at)| {
            row_to_bookmark(stream, last_updated, updated_at)
        }))
    }

    fn save_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO bookmarks (stream, last_updated, updated_at)
             VALUES (?, ?, ?)",
            params![
                bookmark.stream,
                bookmark.last_updated,
                bookmark.updated_at.to_rfc3339()
            ],
        )
        .with_context(|| format!("Failed to save bookmark for {}", bookmark.stream))?;
        Ok(())
    }

    fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT stream, last_updated, updated_at FROM bookmarks ORDER BY stream")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<(String, String, String)>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(stream, last_updated, updated_at)| {
                row_to_bookmark(stream, last_updated, updated_at)
            })
            .collect())
    }
}
