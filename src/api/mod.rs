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


//! Book metadata search
//!
//! Three public search providers behind one shared HTTP client. Each provider
//! parses into the common [`BookMetadata`] shape; [`search_all`] fans out to
//! every provider concurrently and tolerates individual failures.

pub mod client;
pub mod google_books;
pub mod itunes;
pub mod open_library;

use crate::error::Result;
use crate::storage::models::NewBook;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Re-export commonly used types
pub use client::{ClientConfig, SearchClient};

/// Default number of results requested per provider
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Metadata search provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    GoogleBooks,
    OpenLibrary,
    Itunes,
}

impl Provider {
    /// Identifier used in the database and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GoogleBooks => "google-books",
            Provider::OpenLibrary => "open-library",
            Provider::Itunes => "itunes",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "google-books" => Some(Provider::GoogleBooks),
            "open-library" => Some(Provider::OpenLibrary),
            "itunes" => Some(Provider::Itunes),
            _ => None,
        }
    }

    pub fn all() -> [Provider; 3] {
        [Provider::GoogleBooks, Provider::OpenLibrary, Provider::Itunes]
    }
}

/// Provider-independent search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub published_year: Option<i32>,
    pub description: String,
    pub page_count: Option<i32>,
    pub cover_url: Option<String>,
    pub series_name: Option<String>,
    pub series_number: Option<f32>,
    pub provider: Provider,
    pub provider_id: String,
}

impl BookMetadata {
    /// Shape into an insertable book for a user (status defaults to NoStatus)
    pub fn into_new_book(self, username: String) -> NewBook {
        let mut book = NewBook::new(username, self.title);
        book.authors = self.authors;
        book.cover_url = self.cover_url;
        book.description = self.description;
        book.page_count = self.page_count;
        book.series_name = self.series_name;
        book.series_number = self.series_number;
        book.provider = Some(self.provider.as_str().to_string());
        book.provider_id = Some(self.provider_id);
        book
    }
}

/// Search results grouped per provider
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub google_books: Vec<BookMetadata>,
    pub open_library: Vec<BookMetadata>,
    pub itunes: Vec<BookMetadata>,
}

impl SearchResults {
    /// Flatten results in provider order
    pub fn all(&self) -> Vec<&BookMetadata> {
        self.google_books
            .iter()
            .chain(self.open_library.iter())
            .chain(self.itunes.iter())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.google_books.is_empty() && self.open_library.is_empty() && self.itunes.is_empty()
    }
}

/// Search one provider
pub async fn search_provider(
    client: &SearchClient,
    provider: Provider,
    query: &str,
    limit: usize,
) -> Result<Vec<BookMetadata>> {
    match provider {
        Provider::GoogleBooks => google_books::search(client, query, limit).await,
        Provider::OpenLibrary => open_library::search(client, query, limit).await,
        Provider::Itunes => itunes::search(client, query, limit).await,
    }
}

/// Search all providers concurrently
///
/// A failing provider contributes an empty list and a warning log; the other
/// providers' results still come back. Only an empty query is an error.
pub async fn search_all(client: &SearchClient, query: &str, limit: usize) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Err(crate::error::BookFlowError::invalid_input(
            "Search query cannot be empty",
        ));
    }

    let futures = Provider::all()
        .map(|provider| async move { (provider, search_provider(client, provider, query, limit).await) });

    let mut results = SearchResults::default();
    for (provider, outcome) in join_all(futures).await {
        let items = match outcome {
            Ok(items) => items,
            Err(e) => {
                warn!(provider = provider.as_str(), error = %e, "provider search failed");
                Vec::new()
            }
        };
        match provider {
            Provider::GoogleBooks => results.google_books = items,
            Provider::OpenLibrary => results.open_library = items,
            Provider::Itunes => results.itunes = items,
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identifiers_round_trip() {
        for provider in Provider::all() {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str("amazon"), None);
    }

    #[test]
    fn test_metadata_into_new_book() {
        let meta = BookMetadata {
            title: "Dune".to_string(),
            authors: vec!["Frank Herbert".to_string()],
            published_year: Some(1965),
            description: "Desert planet".to_string(),
            page_count: Some(412),
            cover_url: Some("https://example.com/dune.jpg".to_string()),
            series_name: Some("Dune Chronicles".to_string()),
            series_number: Some(1.0),
            provider: Provider::OpenLibrary,
            provider_id: "OL893415W".to_string(),
        };

        let book = meta.into_new_book("alice".to_string());
        assert_eq!(book.title, "Dune");
        assert_eq!(book.status, crate::storage::models::ReadingStatus::NoStatus);
        assert_eq!(book.provider.as_deref(), Some("open-library"));
        assert_eq!(book.provider_id.as_deref(), Some("OL893415W"));
    }

    #[tokio::test]
    async fn test_search_all_rejects_empty_query() {
        let client = SearchClient::new().unwrap();
        assert!(search_all(&client, "   ", 10).await.is_err());
    }
}
