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


//! SQLite persistence layer
//!
//! Everything that touches the database lives under this module: connection
//! management, schema migrations, entity models, and the repository
//! functions.
//!
//! # Database Schema
//! - Books: per-user catalogued books (title, authors, status, series, ...)
//! - Shelves: three fixed status-backed shelves plus user-created containers
//! - BookShelves: custom-shelf membership junction
//! - ReadingChallenges / ReadingLogs: yearly goal and daily page records
//! - FriendRequests / Friends / SharedItems: buddy-sharing records
//! - Profiles: local user records
//!
//! # Usage Example
//! ```no_run
//! use bookflow::storage::{Database, queries, models::NewBook};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create database
//! let db = Database::new("./bookflow.db").await?;
//!
//! // Insert a book
//! let mut new_book = NewBook::new("alice".to_string(), "The Hobbit".to_string());
//! new_book.authors = vec!["J. R. R. Tolkien".to_string()];
//! let book_id = queries::insert_book(db.pool(), &new_book).await?;
//!
//! // Look it up again
//! let book = queries::find_book_by_id(db.pool(), book_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod profiles;
pub mod queries;

// Re-export commonly used types
pub use database::{Database, DatabaseStats};
pub use models::{
    Book, BookShelf, BookSnapshot, Friend, FriendRequest, NewBook, NewReadingChallenge, NewShelf,
    ReadingChallenge, ReadingLog, ReadingStatus, RequestState, SharedItem, SharedItemState, Shelf,
};
