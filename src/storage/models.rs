//! Database models for BookFlow
//!
//! This module contains all database entity models backing the local library,
//! shelves, reading challenge, and buddy-sharing features.
//!
//! # SQLite Adaptations
//! - Arrays stored as JSON strings (SQLite has no native array type)
//! - Enums stored as TEXT using their wire identifiers
//! - DateTime stored as TEXT in ISO 8601 format
//! - Custom-shelf membership uses a junction table (BookShelves)
//! - Structured weekly challenge plans embedded as JSON

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// ENUMS
// ============================================================================

/// Reading status for books
///
/// The three non-`NoStatus` values each back a fixed system shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Read,
    NoStatus,
}

impl ReadingStatus {
    /// Identifier used in the database and in sync payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want-to-read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Read => "read",
            ReadingStatus::NoStatus => "no-status",
        }
    }

    /// Parse from identifier, defaulting unknown values to NoStatus
    pub fn from_str(value: &str) -> Self {
        match value {
            "want-to-read" => ReadingStatus::WantToRead,
            "reading" => ReadingStatus::Reading,
            "read" => ReadingStatus::Read,
            _ => ReadingStatus::NoStatus,
        }
    }

    /// Statuses that back a system shelf (everything except NoStatus)
    pub fn shelf_backed() -> [ReadingStatus; 3] {
        [
            ReadingStatus::WantToRead,
            ReadingStatus::Reading,
            ReadingStatus::Read,
        ]
    }
}

/// State of a friend request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Accepted,
    Rejected,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "pending",
            RequestState::Accepted => "accepted",
            RequestState::Rejected => "rejected",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "accepted" => RequestState::Accepted,
            "rejected" => RequestState::Rejected,
            _ => RequestState::Pending,
        }
    }
}

/// State of an item in the shared-books inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedItemState {
    Pending,
    Accepted,
    Dismissed,
}

impl SharedItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharedItemState::Pending => "pending",
            SharedItemState::Accepted => "accepted",
            SharedItemState::Dismissed => "dismissed",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "accepted" => SharedItemState::Accepted,
            "dismissed" => SharedItemState::Dismissed,
            _ => SharedItemState::Pending,
        }
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity - one catalogued book for one user
///
/// **SQLite Adaptations:**
/// - `authors` stored as a JSON array string
/// - `status` stored as TEXT (ReadingStatus identifier)
/// - custom-shelf membership lives in the BookShelves junction table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    /// Primary key (auto-increment)
    pub book_id: i64,

    /// Stable identifier, survives sync round-trips (UUID v4)
    pub book_uid: String,

    /// Owning local user
    pub username: String,

    pub title: String,
    /// JSON array of author names
    pub authors: String,
    /// ReadingStatus identifier
    pub status: String,

    #[sqlx(default)]
    pub cover_url: Option<String>,
    pub description: String,
    #[sqlx(default)]
    pub page_count: Option<i32>,
    /// Personal star rating, 0.5 to 5.0 in half-star steps
    #[sqlx(default)]
    pub rating: Option<f32>,
    pub notes: String,

    // Series
    #[sqlx(default)]
    pub series_name: Option<String>,
    #[sqlx(default)]
    pub series_number: Option<f32>,

    /// Manual ordering hint within shelves (lower sorts first)
    #[sqlx(default)]
    pub sort_hint: Option<i32>,

    // Where the metadata came from
    #[sqlx(default)]
    pub provider: Option<String>,
    #[sqlx(default)]
    pub provider_id: Option<String>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when status first becomes `read`; feeds yearly challenge progress
    #[sqlx(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Get reading status as enum
    pub fn get_status(&self) -> ReadingStatus {
        ReadingStatus::from_str(&self.status)
    }

    /// Parse authors JSON column into a vector
    pub fn get_authors(&self) -> Vec<String> {
        serde_json::from_str(&self.authors).unwrap_or_default()
    }

    /// First author, used as the author sort key
    pub fn first_author(&self) -> Option<String> {
        self.get_authors().into_iter().next()
    }

    /// "Title (Series #n)" display form when the book belongs to a series
    pub fn title_with_series(&self) -> String {
        match (&self.series_name, self.series_number) {
            (Some(series), Some(number)) => {
                format!("{} ({} #{})", self.title, series, number)
            }
            (Some(series), None) => format!("{} ({})", self.title, series),
            _ => self.title.clone(),
        }
    }
}

/// Shelf - a named grouping of books
///
/// The three status-backed shelves are provisioned per user when a profile
/// is saved (`is_system = true`, non-NULL `status_backed`); user shelves are
/// free containers referenced from the BookShelves junction table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Shelf {
    pub shelf_id: i64,
    /// Stable identifier (UUID v4, or a fixed slug for system shelves)
    pub shelf_uid: String,
    pub username: String,
    pub name: String,
    pub is_system: bool,
    /// ReadingStatus identifier this shelf mirrors; NULL for custom shelves
    #[sqlx(default)]
    pub status_backed: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Shelf {
    /// Status backing this shelf, if it is a system shelf
    pub fn backed_status(&self) -> Option<ReadingStatus> {
        self.status_backed.as_deref().map(ReadingStatus::from_str)
    }
}

/// BookShelf - junction table for Book <-> custom Shelf membership
///
/// Composite primary key: (book_id, shelf_id)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookShelf {
    pub book_id: i64,
    pub shelf_id: i64,
}

/// ReadingChallenge - one row per (username, year)
///
/// **SQLite Adaptations:**
/// - `weekly_plan` holds the structured multi-book weekly challenge as JSON
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReadingChallenge {
    pub challenge_id: i64,
    pub username: String,
    pub year: i32,
    /// Yearly book-count goal
    pub target_books: i32,
    /// Optional flat weekly page target
    #[sqlx(default)]
    pub weekly_page_target: Option<i32>,
    /// Optional structured weekly challenge (JSON, see challenge::WeeklyChallenge)
    #[sqlx(default)]
    pub weekly_plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingChallenge {
    /// Decode the structured weekly challenge, if one is set
    pub fn get_weekly_plan(&self) -> crate::error::Result<Option<crate::challenge::WeeklyChallenge>> {
        match &self.weekly_plan {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }
}

/// ReadingLog - cumulative pages-read entry as manually recorded by the user
///
/// One row per (username, date, book). `book_uid` is NULL for the plain
/// page-paced challenge and set for per-book weekly challenge logging.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReadingLog {
    pub log_id: i64,
    pub username: String,
    pub log_date: NaiveDate,
    /// Cumulative page number the user reported being at on this date
    pub cumulative_pages: i64,
    #[sqlx(default)]
    pub book_uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// FriendRequest - pending/accepted/rejected relationship request
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FriendRequest {
    pub request_id: i64,
    pub from_username: String,
    pub to_username: String,
    /// RequestState identifier
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn get_state(&self) -> RequestState {
        RequestState::from_str(&self.state)
    }
}

/// Friend - one direction of a mutual buddy relationship
///
/// Accepting a request writes two rows, one per direction.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Friend {
    pub username: String,
    pub buddy_username: String,
    pub created_at: DateTime<Utc>,
}

/// SharedItem - inbox row holding a shared book snapshot
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SharedItem {
    pub shared_item_id: i64,
    pub recipient: String,
    pub sender: String,
    /// JSON snapshot of the shared Book
    pub book_snapshot: String,
    /// SharedItemState identifier
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl SharedItem {
    pub fn get_state(&self) -> SharedItemState {
        SharedItemState::from_str(&self.state)
    }

    /// Decode the shared book snapshot
    pub fn get_snapshot(&self) -> crate::error::Result<BookSnapshot> {
        Ok(serde_json::from_str(&self.book_snapshot)?)
    }
}

/// Portable book snapshot used for sharing and sync payloads
///
/// Carries only user-independent metadata; recipient-side import assigns a
/// fresh uid and `no-status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub series_number: Option<f32>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

impl From<&Book> for BookSnapshot {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            authors: book.get_authors(),
            cover_url: book.cover_url.clone(),
            description: book.description.clone(),
            page_count: book.page_count,
            series_name: book.series_name.clone(),
            series_number: book.series_number,
            provider: book.provider.clone(),
            provider_id: book.provider_id.clone(),
        }
    }
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New book record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub username: String,
    pub title: String,
    pub authors: Vec<String>,
    pub status: ReadingStatus,
    pub cover_url: Option<String>,
    pub description: String,
    pub page_count: Option<i32>,
    pub rating: Option<f32>,
    pub notes: String,
    pub series_name: Option<String>,
    pub series_number: Option<f32>,
    pub sort_hint: Option<i32>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

impl NewBook {
    pub fn new(username: String, title: String) -> Self {
        Self {
            username,
            title,
            authors: Vec::new(),
            status: ReadingStatus::NoStatus,
            cover_url: None,
            description: String::new(),
            page_count: None,
            rating: None,
            notes: String::new(),
            series_name: None,
            series_number: None,
            sort_hint: None,
            provider: None,
            provider_id: None,
        }
    }

    /// Build from a shared/search snapshot; status defaults to NoStatus
    pub fn from_snapshot(username: String, snapshot: &BookSnapshot) -> Self {
        Self {
            username,
            title: snapshot.title.clone(),
            authors: snapshot.authors.clone(),
            status: ReadingStatus::NoStatus,
            cover_url: snapshot.cover_url.clone(),
            description: snapshot.description.clone(),
            page_count: snapshot.page_count,
            rating: None,
            notes: String::new(),
            series_name: snapshot.series_name.clone(),
            series_number: snapshot.series_number,
            sort_hint: None,
            provider: snapshot.provider.clone(),
            provider_id: snapshot.provider_id.clone(),
        }
    }
}

/// New custom shelf record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShelf {
    pub username: String,
    pub name: String,
}

impl NewShelf {
    pub fn new(username: String, name: String) -> Self {
        Self { username, name }
    }
}

/// New reading challenge record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReadingChallenge {
    pub username: String,
    pub year: i32,
    pub target_books: i32,
    pub weekly_page_target: Option<i32>,
    pub weekly_plan: Option<String>,
}

impl NewReadingChallenge {
    pub fn new(username: String, year: i32, target_books: i32) -> Self {
        Self {
            username,
            year,
            target_books,
            weekly_page_target: None,
            weekly_plan: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in ReadingStatus::shelf_backed() {
            assert_eq!(ReadingStatus::from_str(status.as_str()), status);
        }
        assert_eq!(ReadingStatus::from_str("no-status"), ReadingStatus::NoStatus);
        assert_eq!(ReadingStatus::from_str("garbage"), ReadingStatus::NoStatus);
    }

    #[test]
    fn test_title_with_series() {
        let mut book = Book {
            book_id: 1,
            book_uid: "uid".to_string(),
            username: "alice".to_string(),
            title: "The Fifth Season".to_string(),
            authors: r#"["N. K. Jemisin"]"#.to_string(),
            status: "read".to_string(),
            cover_url: None,
            description: String::new(),
            page_count: Some(468),
            rating: Some(5.0),
            notes: String::new(),
            series_name: Some("Broken Earth".to_string()),
            series_number: Some(1.0),
            sort_hint: None,
            provider: None,
            provider_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            finished_at: None,
        };

        assert_eq!(book.title_with_series(), "The Fifth Season (Broken Earth #1)");
        assert_eq!(book.first_author().as_deref(), Some("N. K. Jemisin"));

        book.series_name = None;
        assert_eq!(book.title_with_series(), "The Fifth Season");
    }

    #[test]
    fn test_snapshot_from_book() {
        let book = Book {
            book_id: 7,
            book_uid: "uid-7".to_string(),
            username: "alice".to_string(),
            title: "Piranesi".to_string(),
            authors: r#"["Susanna Clarke"]"#.to_string(),
            status: "reading".to_string(),
            cover_url: Some("https://example.com/cover.jpg".to_string()),
            description: "A house with many halls".to_string(),
            page_count: Some(245),
            rating: None,
            notes: "private notes stay local".to_string(),
            series_name: None,
            series_number: None,
            sort_hint: Some(3),
            provider: Some("google-books".to_string()),
            provider_id: Some("abc123".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            finished_at: None,
        };

        let snapshot = BookSnapshot::from(&book);
        assert_eq!(snapshot.title, "Piranesi");
        assert_eq!(snapshot.authors, vec!["Susanna Clarke".to_string()]);
        // Notes and rating are personal, not part of the shared snapshot
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("private notes"));
    }
}
