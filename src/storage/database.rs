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


//! SQLite connection management
//!
//! One [`Database`] owns the connection pool for a single SQLite file (or an
//! in-memory database in tests). Opening it creates the file and its parent
//! directory when missing, applies the connection pragmas, runs pending
//! migrations, and hands out the pool; the repository functions in
//! [`super::queries`] do everything else.
//!
//! Unless the caller overrides the path, the file lives in the platform's
//! application data directory:
//! - macOS: `~/Library/Application Support/BookFlow/bookflow.db`
//! - Linux: `~/.local/share/BookFlow/bookflow.db`
//! - Windows: `%APPDATA%/BookFlow/bookflow.db`
//!
//! Every connection runs with WAL journaling, foreign keys on, normal
//! synchronous mode and a 30 s busy timeout.

use crate::error::{BookFlowError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_POOL_CONNECTIONS: u32 = 5;

/// Connection pool plus the path it was opened from
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>, // None for in-memory databases
}

impl Database {
    /// Open the database file at `path`, creating it if needed
    ///
    /// # Errors
    /// Fails when the parent directory cannot be created, the file cannot be
    /// opened, or a migration does not apply.
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = database_path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BookFlowError::FileIoError(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        db.migrate().await?;

        info!(path = %path.display(), "database ready");

        Ok(db)
    }

    /// In-memory database for tests
    ///
    /// Pool size is pinned to one connection: every `:memory:` connection is
    /// its own database, so a second connection would see empty tables.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool, path: None };
        db.migrate().await?;

        Ok(db)
    }

    /// Apply any pending schema migrations
    ///
    /// Runs automatically when a database is opened; calling it again on an
    /// up-to-date database is a no-op.
    pub async fn migrate(&self) -> Result<()> {
        crate::storage::migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| BookFlowError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    /// The shared connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Path of the backing file; `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the pool and release all connections
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    /// Platform default location for the database file
    pub fn get_default_path() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("BookFlow")
                .join("bookflow.db")
        }

        #[cfg(target_os = "linux")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("BookFlow")
                .join("bookflow.db")
        }

        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("BookFlow").join("bookflow.db")
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            PathBuf::from("./bookflow.db")
        }
    }

    /// Rebuild the database file, reclaiming free pages
    pub async fn vacuum(&self) -> Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    /// Flush the WAL into the main database file
    ///
    /// Called before export so the copied file is self-contained.
    pub async fn checkpoint(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Copy the database file to `output_path`
    pub async fn export<P: AsRef<Path>>(&self, output_path: P) -> Result<()> {
        let source_path = self.path.as_ref().ok_or_else(|| {
            BookFlowError::InvalidState("Cannot export in-memory database".to_string())
        })?;

        self.checkpoint().await?;

        std::fs::copy(source_path, output_path.as_ref()).map_err(|e| {
            BookFlowError::FileIoError(format!(
                "Failed to export database to {}: {}",
                output_path.as_ref().display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Size of the backing file in bytes; 0 for in-memory databases
    pub async fn get_size(&self) -> Result<u64> {
        if let Some(path) = &self.path {
            let metadata = std::fs::metadata(path).map_err(|e| {
                BookFlowError::FileIoError(format!(
                    "Failed to stat database file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(metadata.len())
        } else {
            Ok(0)
        }
    }

    /// Page-level statistics from the SQLite header pragmas
    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await?;

        Ok(DatabaseStats {
            page_count: page_count as u64,
            page_size: page_size as u64,
            freelist_count: freelist_count as u64,
        })
    }

    /// Run SQLite's integrity check; true when the file is sound
    pub async fn check_integrity(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }
}

/// Page counts reported by [`Database::get_stats`]
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub page_count: u64,
    pub page_size: u64,
    /// Free pages that a [`Database::vacuum`] would reclaim
    pub freelist_count: u64,
}

impl DatabaseStats {
    pub fn total_bytes(&self) -> u64 {
        self.page_count * self.page_size
    }

    pub fn free_bytes(&self) -> u64 {
        self.freelist_count * self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new_in_memory()
            .await
            .expect("Failed to create in-memory database");

        let result: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(db.pool())
            .await
            .expect("Failed to query database");

        assert_eq!(result, 1);
        assert!(db.path().is_none());
    }

    #[tokio::test]
    async fn test_on_disk_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("bookflow.db");

        let db = Database::new(&path).await.expect("Failed to create database");
        assert_eq!(db.path(), Some(path.as_path()));

        // Checkpoint so the schema lands in the main file, not just the WAL
        db.checkpoint().await.expect("Failed to checkpoint");
        assert!(db.get_size().await.expect("Failed to get size") > 0);
        db.close().await.expect("Failed to close");
    }

    #[tokio::test]
    async fn test_database_stats() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let stats = db.get_stats().await.expect("Failed to get stats");

        assert!(stats.page_size > 0);
        assert!(stats.page_count > 0);
        assert!(stats.total_bytes() >= stats.free_bytes());
    }

    #[tokio::test]
    async fn test_integrity_check() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let is_ok = db.check_integrity().await.expect("Failed to check integrity");

        assert!(is_ok, "Database integrity check failed");
    }
}
