// BookFlow - Personal Reading Tracker
// Copyright (C) 2025 BookFlow contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Schema creation and migrations
//!
//! Migrations run as plain SQL when a database is opened (sqlx's compile-time
//! migration machinery needs a database at build time, which a client app
//! does not have). Applied migrations are recorded in the `_migrations`
//! table, so reopening an existing file only runs what is new.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Bring the schema up to date, applying any migration not yet recorded
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// The tracking table itself, created outside the migration mechanism
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run one migration unless the tracking table already records it
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(());
    }

    migration_fn.await?;

    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// The whole initial schema: tables, indexes, and the Books timestamp trigger
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- CORE TABLES
-- ============================================================================

-- Books: one catalogued book per user
CREATE TABLE IF NOT EXISTS Books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,

    book_uid TEXT NOT NULL,
    username TEXT NOT NULL,

    title TEXT NOT NULL,
    authors TEXT NOT NULL DEFAULT '[]',  -- JSON array of author names
    status TEXT NOT NULL DEFAULT 'no-status',  -- ReadingStatus identifier

    cover_url TEXT,
    description TEXT NOT NULL DEFAULT '',
    page_count INTEGER,
    rating REAL,  -- Personal star rating, 0.5-5.0
    notes TEXT NOT NULL DEFAULT '',

    -- Series
    series_name TEXT,
    series_number REAL,

    -- Manual ordering hint within shelves
    sort_hint INTEGER,

    -- Metadata provenance
    provider TEXT,  -- google-books, open-library, itunes
    provider_id TEXT,

    -- Timestamps
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    finished_at TEXT,  -- Set when status first becomes 'read'

    UNIQUE(username, book_uid)
);

-- Shelves: status-backed system shelves plus user-created containers
CREATE TABLE IF NOT EXISTS Shelves (
    shelf_id INTEGER PRIMARY KEY AUTOINCREMENT,
    shelf_uid TEXT NOT NULL,
    username TEXT NOT NULL,
    name TEXT NOT NULL,
    is_system INTEGER NOT NULL DEFAULT 0,
    status_backed TEXT,  -- ReadingStatus identifier for system shelves, NULL otherwise
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(username, shelf_uid),
    UNIQUE(username, name)
);

-- ReadingChallenges: one row per (username, year)
CREATE TABLE IF NOT EXISTS ReadingChallenges (
    challenge_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    year INTEGER NOT NULL,
    target_books INTEGER NOT NULL,
    weekly_page_target INTEGER,
    weekly_plan TEXT,  -- Structured multi-book weekly challenge as JSON
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(username, year)
);

-- ReadingLogs: cumulative pages-read-per-day entries
CREATE TABLE IF NOT EXISTS ReadingLogs (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    log_date TEXT NOT NULL,  -- ISO 8601 date (YYYY-MM-DD)
    cumulative_pages INTEGER NOT NULL,
    book_uid TEXT,  -- NULL for the plain page-paced challenge
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- FriendRequests: pending/accepted/rejected relationship requests
CREATE TABLE IF NOT EXISTS FriendRequests (
    request_id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_username TEXT NOT NULL,
    to_username TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(from_username, to_username)
);

-- Friends: one row per direction of a mutual buddy relationship
CREATE TABLE IF NOT EXISTS Friends (
    username TEXT NOT NULL,
    buddy_username TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (username, buddy_username)
);

-- SharedItems: inbox of shared book snapshots awaiting accept/dismiss
CREATE TABLE IF NOT EXISTS SharedItems (
    shared_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient TEXT NOT NULL,
    sender TEXT NOT NULL,
    book_snapshot TEXT NOT NULL,  -- JSON snapshot of the shared Book
    state TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Profiles: local user records (settings kept as JSON for flexibility)
CREATE TABLE IF NOT EXISTS Profiles (
    username TEXT PRIMARY KEY,
    display_name TEXT,
    settings_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ============================================================================
-- JUNCTION TABLES
-- ============================================================================

-- BookShelves: Book <-> custom Shelf membership
CREATE TABLE IF NOT EXISTS BookShelves (
    book_id INTEGER NOT NULL,
    shelf_id INTEGER NOT NULL,
    FOREIGN KEY (book_id) REFERENCES Books(book_id) ON DELETE CASCADE,
    FOREIGN KEY (shelf_id) REFERENCES Shelves(shelf_id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, shelf_id)
);

-- ============================================================================
-- INDEXES
-- ============================================================================

-- Books indexes
CREATE INDEX IF NOT EXISTS idx_books_username ON Books(username);
CREATE INDEX IF NOT EXISTS idx_books_status ON Books(username, status);
CREATE INDEX IF NOT EXISTS idx_books_title ON Books(title);
CREATE INDEX IF NOT EXISTS idx_books_finished_at ON Books(username, finished_at);

-- Shelves indexes
CREATE INDEX IF NOT EXISTS idx_shelves_username ON Shelves(username);

-- BookShelves indexes
CREATE INDEX IF NOT EXISTS idx_book_shelves_shelf ON BookShelves(shelf_id);
CREATE INDEX IF NOT EXISTS idx_book_shelves_book ON BookShelves(book_id);

-- ReadingLogs indexes
CREATE INDEX IF NOT EXISTS idx_reading_logs_user_date ON ReadingLogs(username, log_date);

-- FriendRequests indexes
CREATE INDEX IF NOT EXISTS idx_friend_requests_to ON FriendRequests(to_username, state);
CREATE INDEX IF NOT EXISTS idx_friend_requests_from ON FriendRequests(from_username, state);

-- SharedItems indexes
CREATE INDEX IF NOT EXISTS idx_shared_items_recipient ON SharedItems(recipient, state);

-- ============================================================================
-- TRIGGERS
-- ============================================================================

-- Keep Books.updated_at current on every edit; sync freshness depends on it
CREATE TRIGGER IF NOT EXISTS update_books_timestamp
AFTER UPDATE ON Books
FOR EACH ROW
BEGIN
    UPDATE Books SET updated_at = CURRENT_TIMESTAMP WHERE book_id = NEW.book_id;
END;
        "#,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::storage::database::Database;

    #[tokio::test]
    async fn test_migrations() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        // Verify tables exist
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("Failed to query tables");

        let expected_tables = vec![
            "BookShelves",
            "Books",
            "FriendRequests",
            "Friends",
            "Profiles",
            "ReadingChallenges",
            "ReadingLogs",
            "SharedItems",
            "Shelves",
        ];

        assert_eq!(tables, expected_tables, "Missing or extra tables");
    }

    #[tokio::test]
    async fn test_migration_tracking() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .expect("Failed to query migrations");

        assert!(count > 0, "No migrations recorded");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create database");

        let fk_enabled: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("Failed to check foreign keys");

        assert_eq!(fk_enabled, 1, "Foreign keys not enabled");
    }
}
